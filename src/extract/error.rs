//! Error types for the extraction module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for selector-sequenced extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Page render failure surfaced through a page source
    #[error("page error: {0}")]
    Page(String),

    /// LLM collaborator failure for one attempt
    #[error("LLM error: {0}")]
    Llm(String),

    /// Every selector and retry round was exhausted without an accepted
    /// candidate
    #[error("no usable data after {rounds} round(s) of selector attempts")]
    Exhausted {
        /// Number of rounds that were attempted
        rounds: u32,
    },
}

impl From<ExtractError> for CrateError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Exhausted { .. } => CrateError::NoData(err.to_string()),
            ExtractError::Page(msg) => CrateError::Browser(msg),
            ExtractError::Llm(msg) => CrateError::Llm(msg),
        }
    }
}
