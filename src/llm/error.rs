//! Error types for the LLM extraction module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for LLM extraction calls
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Please retry after {retry_after_secs} seconds")]
    RateLimit {
        /// Seconds to wait before retrying
        retry_after_secs: u64,
    },

    /// Completion did not contain parseable JSON
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<LlmError> for CrateError {
    fn from(err: LlmError) -> Self {
        CrateError::Llm(err.to_string())
    }
}
