//! LLM extraction collaborator
//!
//! This module provides the client for the OpenAI-compatible API used to
//! turn scoped HTML fragments into structured JSON payloads.

mod client;
mod error;

pub use client::LlmClient;
pub use error::LlmError;
