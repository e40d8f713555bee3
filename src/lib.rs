//! # matchcentre - WhoScored Match Centre Timeline Scraper
//!
//! This crate scrapes a single WhoScored match page, locates the
//! timeline/ratings widget through a ranked CSS-selector fallback chain,
//! extracts structured data via an OpenAI-compatible LLM API, normalizes
//! the heterogeneous output into one canonical envelope, and writes JSON
//! plus a human-readable summary to disk.
//!
//! ## Features
//!
//! - Headless Chrome rendering for a JavaScript-heavy target site
//! - Ordered selector strategies with a broad context fallback and outer
//!   retry rounds
//! - Heuristic acceptance checks that keep navigation chrome and cookie
//!   banners out of the results
//! - Shape-tolerant normalization: mapping, sequence, or scalar payloads
//!   all produce the same envelope
//! - Async API with Tokio, structured logging with tracing
//!
//! ## Example
//!
//! ```rust,no_run
//! use matchcentre::config::ScrapeConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), matchcentre::Error> {
//!     let config = ScrapeConfig::from_env();
//!     let outcome = matchcentre::pipeline::run(&config).await?;
//!     println!("{}", outcome.report);
//!     Ok(())
//! }
//! ```

mod error;

pub mod browser;
pub mod config;
pub mod extract;
pub mod llm;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod urls;

pub use error::{Error, Result};
