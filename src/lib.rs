pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod policy;
pub mod store;
pub mod ui;
pub mod version;

pub use error::{RelflowError, Result};
