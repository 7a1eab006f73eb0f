//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the git operations
//! the release flow needs, allowing for multiple implementations including
//! real repositories and a mock implementation for testing.
//!
//! The primary abstraction is the [Repository] trait. Concrete
//! implementations:
//!
//! - [repository::Git2Repository]: a real implementation using the `git2` crate
//! - [mock::MockRepository]: an in-memory implementation for testing
//!
//! The flow engine depends on the trait rather than on `git2` directly, so
//! every branch/tag/push sequence can be asserted against the mock.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use std::path::Path;

/// Common git operation trait for abstraction
///
/// All implementors must be `Send + Sync`. Methods return
/// [crate::error::Result]; implementations map underlying failures (like
/// `git2::Error`) onto the appropriate [crate::error::RelflowError] variant,
/// keeping the collaborator's diagnostic text intact so the user can act on
/// it.
pub trait Repository: Send + Sync {
    /// Name of the currently checked-out branch
    fn current_branch(&self) -> Result<String>;

    /// Names of all local branches
    fn branch_names(&self) -> Result<Vec<String>>;

    /// Whether a local branch with this name exists
    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Whether a tag with this name exists
    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Create a branch at the current HEAD commit
    fn create_branch_from_head(&self, name: &str) -> Result<()>;

    /// Create a branch at an arbitrary revision (branch name, tag name, SHA)
    fn create_branch_at(&self, name: &str, rev: &str) -> Result<()>;

    /// Check out a branch, updating the working tree
    fn checkout(&self, name: &str) -> Result<()>;

    /// Stage a single path and commit it on the current branch
    fn commit_path(&self, path: &Path, message: &str) -> Result<()>;

    /// Push a branch to the remote, optionally setting upstream tracking
    fn push_branch(&self, remote: &str, branch: &str, set_upstream: bool) -> Result<()>;

    /// Create a lightweight tag at the current HEAD commit
    fn create_tag(&self, name: &str) -> Result<()>;

    /// Delete a local tag
    fn delete_tag(&self, name: &str) -> Result<()>;

    /// Push a tag to the remote
    fn push_tag(&self, remote: &str, name: &str) -> Result<()>;

    /// Delete a tag on the remote
    fn delete_remote_tag(&self, remote: &str, name: &str) -> Result<()>;

    /// Number of commits `tip` has that `base` does not
    ///
    /// Both arguments are revisions (branch names, tag names or SHAs). The
    /// git equivalent is `git rev-list --count base..tip`.
    fn ahead_count(&self, base: &str, tip: &str) -> Result<usize>;
}
