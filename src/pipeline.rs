//! End-to-end scrape orchestration
//!
//! Wires the components together in their fixed order: URL precondition,
//! browser launch, availability probe (informative only), selector-sequenced
//! extraction, normalization, report rendering, and persistence. The browser
//! session is owned by this function and therefore released on every exit
//! path, including errors.

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use crate::browser::{BrowserSession, PageAnalysis, analyze_page};
use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use crate::extract::{HeuristicValidator, Sequencer};
use crate::llm::LlmClient;
use crate::normalize::{MatchEnvelope, normalize};
use crate::report::build_summary_report;
use crate::storage::save_envelope;
use crate::urls::validate_match_url;

/// Everything produced by a successful run
#[derive(Debug)]
pub struct ScrapeOutcome {
    /// The persisted envelope
    pub envelope: MatchEnvelope,

    /// The rendered text summary
    pub report: String,

    /// Where the JSON document was written
    pub json_path: PathBuf,

    /// Where the summary was written
    pub summary_path: PathBuf,
}

/// Run the whole pipeline for one match URL.
#[instrument(skip(config), fields(url = %config.match_url))]
pub async fn run(config: &ScrapeConfig) -> Result<ScrapeOutcome> {
    if !validate_match_url(&config.match_url) {
        return Err(Error::InvalidUrl(config.match_url.clone()));
    }

    let session = BrowserSession::launch(
        &config.browser,
        &config.match_url,
        Some(config.selectors.primary.clone()),
    )
    .await?;

    let analysis = probe(&session, config).await;

    let validator = HeuristicValidator::new(config.validation);
    let client = LlmClient::new(&config.llm)?;
    let sequencer = Sequencer::new(&config.selectors, &config.retry, &validator)
        .prefer(analysis.selectors_present.clone());

    let accepted = sequencer.run(&session, &client).await?;
    info!(selector = %accepted.selector, "extraction accepted");

    // The browser is no longer needed once a candidate is accepted.
    drop(session);

    let envelope = normalize(accepted.candidate);
    let report = build_summary_report(&envelope);
    let saved = save_envelope(&envelope, &report, &config.output_path).await?;

    Ok(ScrapeOutcome {
        envelope,
        report,
        json_path: saved.json_path,
        summary_path: saved.summary_path,
    })
}

/// Load the page once and size it up. Failures are logged, never fatal:
/// the target site's markup shifts over time and a broken probe must not
/// take the whole tool down with it.
async fn probe(session: &BrowserSession, config: &ScrapeConfig) -> PageAnalysis {
    match session.render_page().await {
        Ok(page) => {
            let analysis = analyze_page(&page, &config.selectors);
            info!(
                content_length = analysis.content_length,
                keyword_hits = analysis.total_keyword_hits(),
                rating_signals = analysis.rating_signals,
                selectors_present = analysis.selectors_present.len(),
                looks_like_match = analysis.has_match_content(),
                "page probe complete"
            );
            if !analysis.has_match_content() {
                warn!("page does not look like a match centre; proceeding anyway");
            }
            analysis
        }
        Err(err) => {
            warn!("page probe failed: {err}; proceeding anyway");
            PageAnalysis::unavailable()
        }
    }
}

/// Load the page once and return the full analysis without any LLM calls.
/// Unlike the in-pipeline probe, a load failure here is an error: the
/// analysis is the entire point of the call.
#[instrument(skip(config), fields(url = %config.match_url))]
pub async fn diagnose(config: &ScrapeConfig) -> Result<PageAnalysis> {
    let session = BrowserSession::launch(
        &config.browser,
        &config.match_url,
        Some(config.selectors.primary.clone()),
    )
    .await?;

    let page = session.render_page().await?;
    Ok(analyze_page(&page, &config.selectors))
}
