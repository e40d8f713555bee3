//! Best-effort page availability probe
//!
//! Estimates, without any LLM cost, whether a rendered page actually holds
//! match/timeline content: keyword occurrence counts, rating-like number
//! density, and which of the configured selectors are present. The probe
//! never fails a run; an unavailable page yields a record with
//! `page_loaded = false` and callers proceed regardless.

use crate::config::SelectorSet;
use crate::extract::{percent_pattern, rating_pattern};

use super::RenderedPage;

/// Keywords counted when sizing up a match page.
pub const PROBE_KEYWORDS: &[&str] = &[
    "match",
    "timeline",
    "rating",
    "score",
    "performance",
    "stats",
    "player",
    "passes",
    "shots",
    "tackles",
    "dribbles",
];

/// How many pattern examples to keep for diagnostics.
const EXAMPLE_LIMIT: usize = 10;

/// Diagnostic record for one page load
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    /// Whether the page could be loaded at all
    pub page_loaded: bool,

    /// Size of the rendered HTML in bytes
    pub content_length: usize,

    /// Occurrence count per probe keyword
    pub keyword_hits: Vec<(&'static str, usize)>,

    /// Number of rating-like values (5.0-9.9)
    pub rating_signals: usize,

    /// Sample of the rating-like values found
    pub rating_examples: Vec<String>,

    /// Number of percentage values
    pub percent_signals: usize,

    /// Configured selectors that matched at least one element
    pub selectors_present: Vec<String>,
}

impl PageAnalysis {
    /// Record for a page that could not be loaded.
    pub fn unavailable() -> Self {
        Self {
            page_loaded: false,
            content_length: 0,
            keyword_hits: Vec::new(),
            rating_signals: 0,
            rating_examples: Vec::new(),
            percent_signals: 0,
            selectors_present: Vec::new(),
        }
    }

    /// Total keyword occurrences across the probe set.
    pub fn total_keyword_hits(&self) -> usize {
        self.keyword_hits.iter().map(|(_, count)| count).sum()
    }

    /// Whether the page looks like it carries detailed timeline data.
    pub fn has_match_content(&self) -> bool {
        self.page_loaded && self.total_keyword_hits() > 20 && self.rating_signals > 5
    }
}

/// Analyze one rendered page against the configured selectors.
pub fn analyze_page(page: &RenderedPage, selectors: &SelectorSet) -> PageAnalysis {
    let lower = page.html.to_lowercase();

    let keyword_hits = PROBE_KEYWORDS
        .iter()
        .map(|keyword| (*keyword, lower.matches(keyword).count()))
        .collect();

    let rating_examples: Vec<String> = rating_pattern()
        .find_iter(&page.html)
        .take(EXAMPLE_LIMIT)
        .map(|found| found.as_str().to_string())
        .collect();

    let selectors_present = selectors
        .all()
        .filter(|selector| page.select(selector).is_some())
        .map(str::to_string)
        .collect();

    PageAnalysis {
        page_loaded: true,
        content_length: page.html.len(),
        keyword_hits,
        rating_signals: rating_pattern().find_iter(&page.html).count(),
        rating_examples,
        percent_signals: percent_pattern().find_iter(&page.html).count(),
        selectors_present,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_page() -> RenderedPage {
        RenderedPage::new(
            "https://example.com/match",
            r#"
            <html><body>
                <div id="matchcentre-timeline-minutes">
                    timeline rating 7.4 rating 6.8 score 2-1 player stats
                </div>
                <div class="score-box">possession 54%</div>
            </body></html>
            "#,
        )
    }

    #[test]
    fn test_analyze_counts_keywords_and_signals() {
        let analysis = analyze_page(&match_page(), &SelectorSet::default());
        assert!(analysis.page_loaded);
        assert!(analysis.content_length > 0);
        assert_eq!(analysis.rating_signals, 2);
        assert_eq!(analysis.rating_examples, vec!["7.4", "6.8"]);
        assert_eq!(analysis.percent_signals, 1);
        assert!(analysis.total_keyword_hits() >= 5);
    }

    #[test]
    fn test_analyze_detects_present_selectors() {
        let analysis = analyze_page(&match_page(), &SelectorSet::default());
        assert!(
            analysis
                .selectors_present
                .contains(&"div#matchcentre-timeline-minutes".to_string())
        );
        assert!(
            analysis
                .selectors_present
                .contains(&"div.score-box".to_string())
        );
        assert!(!analysis.selectors_present.contains(&"div#timeline".to_string()));
    }

    #[test]
    fn test_unavailable_record() {
        let analysis = PageAnalysis::unavailable();
        assert!(!analysis.page_loaded);
        assert_eq!(analysis.total_keyword_hits(), 0);
        assert!(!analysis.has_match_content());
    }

    #[test]
    fn test_sparse_page_has_no_match_content() {
        let page = RenderedPage::new("https://example.com", "<p>404 not found</p>");
        let analysis = analyze_page(&page, &SelectorSet::default());
        assert!(analysis.page_loaded);
        assert!(!analysis.has_match_content());
    }
}
