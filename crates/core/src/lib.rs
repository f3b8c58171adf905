//! Shared foundation for the docpilot workspace.
//!
//! Holds the unified error type, configuration loading, and logging setup
//! used by every other crate.

pub mod config;
pub mod error;
pub mod logging;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
