use thiserror::Error;

/// Unified error type for relflow operations
#[derive(Error, Debug)]
pub enum RelflowError {
    #[error("Invalid version: {0}")]
    Version(String),

    #[error("version.info not found. Run 'relflow init' from the main branch first.")]
    RecordNotFound,

    #[error("version.info is corrupt: {0}")]
    RecordCorrupt(String),

    #[error("version.info already exists. Initialization aborted.")]
    AlreadyInitialized,

    #[error("{0}")]
    Policy(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in relflow
pub type Result<T> = std::result::Result<T, RelflowError>;

impl RelflowError {
    /// Create a version parse error with context
    pub fn version(msg: impl Into<String>) -> Self {
        RelflowError::Version(msg.into())
    }

    /// Create a branch/tag policy violation with context
    pub fn policy(msg: impl Into<String>) -> Self {
        RelflowError::Policy(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        RelflowError::Remote(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        RelflowError::Config(msg.into())
    }

    /// Create a corrupt-record error with context
    pub fn corrupt(msg: impl Into<String>) -> Self {
        RelflowError::RecordCorrupt(msg.into())
    }
}
