//! Headless browser module
//!
//! This module owns the single Chrome session used by a run and provides
//! selector-scoped access to the rendered page, plus a best-effort probe
//! that estimates whether match content is present at all.

mod error;
mod probe;
mod session;

pub use error::BrowserError;
pub use probe::{PageAnalysis, analyze_page};
pub use session::BrowserSession;

use scraper::{Html, Selector};
use tracing::warn;

/// A fully rendered page snapshot
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL the snapshot was taken from
    pub url: String,

    /// Rendered HTML
    pub html: String,
}

impl RenderedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// Return the HTML of every element matching `selector_group`, or None
    /// when nothing matches (or the selector fails to parse).
    pub fn select(&self, selector_group: &str) -> Option<String> {
        let selector = match Selector::parse(selector_group) {
            Ok(selector) => selector,
            Err(err) => {
                warn!("failed to parse selector '{}': {}", selector_group, err);
                return None;
            }
        };

        let document = Html::parse_document(&self.html);
        let mut fragment = String::new();
        for element in document.select(&selector) {
            fragment.push_str(&element.html());
            fragment.push('\n');
        }

        let trimmed = fragment.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_returns_matching_fragment() {
        let page = RenderedPage::new(
            "https://example.com",
            "<html><body><div id=\"timeline\">ratings</div><p>other</p></body></html>",
        );
        let fragment = page.select("div#timeline").unwrap();
        assert!(fragment.contains("ratings"));
        assert!(!fragment.contains("other"));
    }

    #[test]
    fn test_select_group_collects_all_matches() {
        let page = RenderedPage::new(
            "https://example.com",
            "<div class=\"a\">one</div><div class=\"b\">two</div>",
        );
        let fragment = page.select("div.a, div.b").unwrap();
        assert!(fragment.contains("one"));
        assert!(fragment.contains("two"));
    }

    #[test]
    fn test_select_misses_return_none() {
        let page = RenderedPage::new("https://example.com", "<p>nothing here</p>");
        assert!(page.select("div#absent").is_none());
        assert!(page.select(":::not a selector:::").is_none());
    }
}
