//! Error types for the matchcentre crate

use thiserror::Error;

/// Result type for matchcentre operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for matchcentre operations
#[derive(Debug, Error)]
pub enum Error {
    /// The match URL does not match the expected path shape
    #[error("invalid match URL: {0}")]
    InvalidUrl(String),

    /// Browser launch, navigation, or content capture error
    #[error("browser error: {0}")]
    Browser(String),

    /// LLM extraction call error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Every selector and retry round was exhausted without usable data
    #[error("no data extracted: {0}")]
    NoData(String),

    /// Disk write error for the envelope or summary
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
