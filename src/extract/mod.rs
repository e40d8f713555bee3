//! Selector-fallback extraction
//!
//! This module holds the core orchestration of a scrape: an ordered list of
//! CSS selectors is tried against the rendered page, each scoped fragment is
//! handed to the LLM collaborator, and every candidate passes through an
//! acceptance policy. The first accepted candidate wins. When all targeted
//! selectors are exhausted, a single broader "context" extraction is
//! attempted with a looser threshold, and the whole sequence is retried a
//! configured number of rounds to absorb transient failures.

mod error;
mod validator;

pub use error::ExtractError;
pub use validator::{DOMAIN_KEYWORDS, HeuristicValidator, SelectorScope, ValidationPolicy};
pub(crate) use validator::{percent_pattern, rating_pattern};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::browser::RenderedPage;
use crate::config::{RetryConfig, SelectorSet};

/// The raw payload returned by one extraction attempt.
///
/// The LLM sometimes returns an object, sometimes a list, sometimes a bare
/// value; keeping the three shapes as explicit variants lets every
/// downstream branch be matched exhaustively instead of probing types ad
/// hoc.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionCandidate {
    /// A JSON object
    Mapping(Map<String, Value>),

    /// A JSON array
    Sequence(Vec<Value>),

    /// Anything else (string, number, boolean, null)
    Scalar(Value),
}

impl From<Value> for ExtractionCandidate {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Mapping(map),
            Value::Array(items) => Self::Sequence(items),
            other => Self::Scalar(other),
        }
    }
}

impl ExtractionCandidate {
    /// Name of the original payload shape, recorded in envelope metadata.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
            Self::Scalar(Value::String(_)) => "string",
            Self::Scalar(Value::Number(_)) => "number",
            Self::Scalar(Value::Bool(_)) => "boolean",
            Self::Scalar(_) => "null",
        }
    }

    /// The candidate as a plain JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Mapping(map) => Value::Object(map.clone()),
            Self::Sequence(items) => Value::Array(items.clone()),
            Self::Scalar(value) => value.clone(),
        }
    }

    /// Textual representation used by acceptance policies.
    pub fn to_text(&self) -> String {
        match self {
            Self::Scalar(Value::String(text)) => text.clone(),
            other => other.to_value().to_string(),
        }
    }

    /// True for payloads with no content at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Mapping(map) => map.is_empty(),
            Self::Sequence(items) => items.is_empty(),
            Self::Scalar(Value::Null) => true,
            Self::Scalar(Value::String(text)) => text.trim().is_empty(),
            Self::Scalar(_) => false,
        }
    }
}

/// Source of rendered pages for the sequencer.
///
/// The live implementation is the browser session; tests substitute a stub
/// with canned HTML.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Render the target page and return its HTML snapshot.
    async fn render(&self) -> Result<RenderedPage, ExtractError>;
}

/// Extraction collaborator: turns a scoped HTML fragment into a candidate.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract structured data from one HTML fragment.
    async fn extract(&self, fragment: &str) -> Result<ExtractionCandidate, ExtractError>;
}

/// A candidate that passed validation, with the selector that produced it.
#[derive(Debug, Clone)]
pub struct AcceptedExtraction {
    /// The accepted payload
    pub candidate: ExtractionCandidate,

    /// The selector (or combined context group) that produced it
    pub selector: String,

    /// Whether it came from a targeted selector or the context fallback
    pub scope: SelectorScope,
}

/// Walks the selector strategies against a page until a candidate is
/// accepted or every strategy and retry round is exhausted.
pub struct Sequencer<'a> {
    selectors: &'a SelectorSet,
    retry: &'a RetryConfig,
    policy: &'a dyn ValidationPolicy,
    preferred: Vec<String>,
}

impl<'a> Sequencer<'a> {
    pub fn new(
        selectors: &'a SelectorSet,
        retry: &'a RetryConfig,
        policy: &'a dyn ValidationPolicy,
    ) -> Self {
        Self {
            selectors,
            retry,
            policy,
            preferred: Vec::new(),
        }
    }

    /// Promote alternatives already observed on the page (e.g. by the
    /// availability probe) ahead of the rest. Relative order within each
    /// group is preserved; the primary selector always goes first.
    pub fn prefer(mut self, preferred: Vec<String>) -> Self {
        self.preferred = preferred;
        self
    }

    fn targeted_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = vec![self.selectors.primary.as_str()];
        let (seen, unseen): (Vec<&String>, Vec<&String>) = self
            .selectors
            .alternatives
            .iter()
            .partition(|selector| self.preferred.iter().any(|p| p == *selector));
        order.extend(seen.into_iter().map(String::as_str));
        order.extend(unseen.into_iter().map(String::as_str));
        order
    }

    /// Run the full retry loop. Individual selector or LLM failures are
    /// logged and skipped; only total exhaustion is an error.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        source: &dyn PageSource,
        extractor: &dyn Extractor,
    ) -> Result<AcceptedExtraction, ExtractError> {
        for round in 1..=self.retry.max_rounds {
            if round > 1 {
                debug!(round, "waiting before next extraction round");
                sleep(self.retry.request_delay).await;
            }

            let page = match source.render().await {
                Ok(page) => page,
                Err(err) => {
                    warn!(round, "page render failed: {err}");
                    continue;
                }
            };

            if let Some(accepted) = self.try_page(&page, extractor).await {
                return Ok(accepted);
            }
            info!(round, "no selector produced an accepted candidate");
        }

        Err(ExtractError::Exhausted {
            rounds: self.retry.max_rounds,
        })
    }

    async fn try_page(
        &self,
        page: &RenderedPage,
        extractor: &dyn Extractor,
    ) -> Option<AcceptedExtraction> {
        for selector in self.targeted_order() {
            let Some(fragment) = page.select(selector) else {
                debug!(selector, "selector matched nothing");
                continue;
            };

            match extractor.extract(&fragment).await {
                Ok(candidate) => {
                    if self.policy.accept(&candidate, SelectorScope::Targeted) {
                        info!(selector, "candidate accepted");
                        return Some(AcceptedExtraction {
                            candidate,
                            selector: selector.to_string(),
                            scope: SelectorScope::Targeted,
                        });
                    }
                    debug!(selector, "candidate rejected by validation policy");
                }
                Err(err) => warn!(selector, "extraction attempt failed: {err}"),
            }
        }

        // Broad fallback: one combined query over the context group.
        let combined = self.selectors.combined_context();
        let fragment = page.select(&combined)?;
        match extractor.extract(&fragment).await {
            Ok(candidate) if self.policy.accept(&candidate, SelectorScope::Context) => {
                info!(selector = %combined, "context fallback accepted");
                Some(AcceptedExtraction {
                    candidate,
                    selector: combined,
                    scope: SelectorScope::Context,
                })
            }
            Ok(_) => {
                debug!("context fallback rejected by validation policy");
                None
            }
            Err(err) => {
                warn!("context fallback extraction failed: {err}");
                None
            }
        }
    }
}
