//! # Run Configuration Module
//!
//! This module provides the immutable configuration for a scrape run. The
//! configuration is built once at process start (from environment variables
//! and CLI overrides) and passed by reference into every component; no
//! component reads ambient global state.
//!
//! ## Key Components
//!
//! - `ScrapeConfig`: the complete configuration for one run
//! - `LlmConfig`, `BrowserConfig`, `SelectorSet`, `RetryConfig`,
//!   `ValidationThresholds`: per-concern sub-configurations with
//!   documented defaults
//!
//! Every environment value has a default, so a bare `from_env()` always
//! yields a usable configuration (the API key excepted: real runs need
//! `OPENAI_API_KEY` set).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Instruction block sent to the LLM with every extraction request.
pub const EXTRACTION_INSTRUCTIONS: &str = "\
You are analyzing a WhoScored.com match centre page to extract timeline rating data.

EXTRACT the following information:
1. Match Information: team names, score, date, competition
2. Timeline Data: player/team ratings by minute/period
3. Match Events: goals, cards, substitutions with exact timestamps
4. Rating Changes: how ratings evolve throughout the match
5. Performance Metrics: key statistics by time period

IGNORE completely: advertisement content, promotional banners, social media
widgets, navigation menus, cookie notices, pop-up overlays.

FOCUS on: data from the match centre timeline container, numerical ratings
and statistics, timestamped events and changes, performance data tables.

Return clean, structured JSON with timeline progression and rating data.";

/// Configuration for the LLM extraction client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// API credential (bearer token)
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    pub api_base: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token limit
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            temperature: 0.1,
            max_tokens: 4000,
        }
    }
}

/// Configuration for the headless browser session
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run Chrome without a visible window
    pub headless: bool,

    /// Viewport width in pixels
    pub viewport_width: u32,

    /// Viewport height in pixels
    pub viewport_height: u32,

    /// Page load timeout
    pub page_timeout: Duration,

    /// Fixed delay to let client-side rendering settle when the expected
    /// selector never appears
    pub settle_delay: Duration,

    /// User agent presented to the target site
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            page_timeout: Duration::from_secs(60),
            settle_delay: Duration::from_secs(2),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Ordered CSS selector strategies tried against the rendered page
#[derive(Debug, Clone)]
pub struct SelectorSet {
    /// The selector expected to hold the timeline widget
    pub primary: String,

    /// Fallback selectors tried in order after the primary
    pub alternatives: Vec<String>,

    /// Broad, lower-precision selectors combined into one group query after
    /// all targeted selectors fail
    pub context: Vec<String>,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            primary: "div#matchcentre-timeline-minutes".to_string(),
            alternatives: vec![
                "div.match-centre-container".to_string(),
                "div.timeline-container".to_string(),
                "div#timeline".to_string(),
                "div#match-centre".to_string(),
                "[class*='timeline']".to_string(),
                "[class*='matchcentre']".to_string(),
            ],
            context: vec![
                "div#match-centre".to_string(),
                "div#match-centre-header".to_string(),
                "div#match-centre-content".to_string(),
                "div.match-header".to_string(),
                "div.score-box".to_string(),
            ],
        }
    }
}

impl SelectorSet {
    /// All configured selectors in the order they would be attempted.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str())
            .chain(self.alternatives.iter().map(String::as_str))
            .chain(self.context.iter().map(String::as_str))
    }

    /// The context group joined into a single CSS group selector.
    pub fn combined_context(&self) -> String {
        self.context.join(", ")
    }
}

/// Retry policy for the whole selector sequence
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of rounds over the full selector sequence
    pub max_rounds: u32,

    /// Fixed delay between rounds
    pub request_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            request_delay: Duration::from_secs(2),
        }
    }
}

/// Acceptance thresholds for extraction candidates.
///
/// The values are empirically chosen and deliberately kept as data rather
/// than hard-coded at the call sites, so they can be tuned without touching
/// the sequencing logic.
#[derive(Debug, Clone, Copy)]
pub struct ValidationThresholds {
    /// Minimum textual length for a candidate from a targeted selector
    pub min_chars_targeted: usize,

    /// Looser minimum length for the broad context fallback
    pub min_chars_context: usize,

    /// Minimum number of distinct domain keywords present
    pub min_keywords: usize,

    /// Minimum number of rating-like or percentage patterns, applied only
    /// in enhanced mode
    pub min_rating_signals: usize,

    /// Require rating/percentage signals in addition to keywords
    pub enhanced: bool,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            min_chars_targeted: 200,
            min_chars_context: 100,
            min_keywords: 2,
            min_rating_signals: 2,
            enhanced: false,
        }
    }
}

/// Complete, immutable configuration for one scrape run
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Target match URL
    pub match_url: String,

    /// LLM client settings
    pub llm: LlmConfig,

    /// Browser session settings
    pub browser: BrowserConfig,

    /// Selector strategies
    pub selectors: SelectorSet,

    /// Outer retry policy
    pub retry: RetryConfig,

    /// Candidate acceptance thresholds
    pub validation: ValidationThresholds,

    /// Path of the output JSON document
    pub output_path: PathBuf,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            match_url: "https://www.whoscored.com/matches/1821372/live/\
                        england-premier-league-2024-2025-nottingham-forest-brentford"
                .to_string(),
            llm: LlmConfig::default(),
            browser: BrowserConfig::default(),
            selectors: SelectorSet::default(),
            retry: RetryConfig::default(),
            validation: ValidationThresholds::default(),
            output_path: PathBuf::from("match_timeline_data.json"),
        }
    }
}

impl ScrapeConfig {
    /// Build a configuration from environment variables, falling back to
    /// the documented defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("MATCH_URL") {
            config.match_url = url;
        }
        if let Ok(model) = env::var("LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            config.llm.api_key = key;
        }
        if let Ok(base) = env::var("OPENAI_API_BASE") {
            config.llm.api_base = base;
        }
        if let Some(rounds) = env_parse::<u32>("MAX_RETRIES") {
            config.retry.max_rounds = rounds;
        }
        if let Some(delay) = env_parse::<f64>("REQUEST_DELAY") {
            config.retry.request_delay = Duration::from_secs_f64(delay);
            config.browser.settle_delay = Duration::from_secs_f64(delay);
        }
        if let Some(timeout) = env_parse::<u64>("TIMEOUT_DURATION") {
            config.browser.page_timeout = Duration::from_secs(timeout);
        }
        if let Some(width) = env_parse::<u32>("VIEWPORT_WIDTH") {
            config.browser.viewport_width = width;
        }
        if let Some(height) = env_parse::<u32>("VIEWPORT_HEIGHT") {
            config.browser.viewport_height = height;
        }
        if let Ok(path) = env::var("OUTPUT_FILE") {
            config.output_path = PathBuf::from(path);
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.retry.max_rounds, 3);
        assert_eq!(config.retry.request_delay, Duration::from_secs(2));
        assert_eq!(config.browser.viewport_width, 1920);
        assert_eq!(config.validation.min_chars_targeted, 200);
        assert_eq!(config.validation.min_chars_context, 100);
        assert!(!config.validation.enhanced);
        assert_eq!(config.output_path, PathBuf::from("match_timeline_data.json"));
    }

    #[test]
    fn test_selector_order() {
        let selectors = SelectorSet::default();
        let all: Vec<&str> = selectors.all().collect();
        assert_eq!(all[0], "div#matchcentre-timeline-minutes");
        assert_eq!(all.len(), 1 + selectors.alternatives.len() + selectors.context.len());
    }

    #[test]
    fn test_combined_context_selector() {
        let selectors = SelectorSet {
            context: vec!["div#a".to_string(), "div.b".to_string()],
            ..SelectorSet::default()
        };
        assert_eq!(selectors.combined_context(), "div#a, div.b");
    }
}
