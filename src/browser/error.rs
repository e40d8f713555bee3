//! Error types for the browser module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for browser operations
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Chrome could not be launched
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// A tab could not be opened
    #[error("failed to open tab: {0}")]
    Tab(String),

    /// Navigation failed or timed out
    #[error("navigation error: {0}")]
    Navigation(String),

    /// The rendered HTML could not be captured
    #[error("content capture error: {0}")]
    Content(String),

    /// The blocking browser task could not be joined
    #[error("browser task error: {0}")]
    Task(String),
}

impl From<BrowserError> for CrateError {
    fn from(err: BrowserError) -> Self {
        CrateError::Browser(err.to_string())
    }
}
