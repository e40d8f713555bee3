//! Heuristic acceptance checks for extraction candidates
//!
//! An LLM extraction can return a syntactically valid but semantically
//! empty document (navigation chrome, cookie banners). The checks here gate
//! candidates on content size, domain keywords, and in enhanced mode
//! rating-like number density. They are heuristics, not a schema check.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::ValidationThresholds;

use super::ExtractionCandidate;

/// Keywords expected somewhere in a genuine match data payload.
pub const DOMAIN_KEYWORDS: &[&str] = &[
    "match",
    "team",
    "score",
    "rating",
    "timeline",
    "performance",
    "stats",
    "player",
];

/// Which kind of selector produced a candidate. The broad context fallback
/// gets a looser size threshold than targeted selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorScope {
    /// The primary selector or one of the alternatives
    Targeted,
    /// The combined context selector group
    Context,
}

/// Accept/reject policy for extraction candidates.
///
/// Kept as a trait so tests (and future callers) can substitute stricter or
/// synthetic policies without touching the sequencer.
pub trait ValidationPolicy: Send + Sync {
    /// Returns true if the candidate should be accepted as the run's result.
    fn accept(&self, candidate: &ExtractionCandidate, scope: SelectorScope) -> bool;
}

/// Pattern matching rating-like values (5.0-9.9).
pub(crate) fn rating_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[5-9]\.\d\b").expect("rating pattern compiles"))
}

/// Pattern matching percentage values.
pub(crate) fn percent_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{1,3}%").expect("percent pattern compiles"))
}

/// Number of rating-like values in `text`.
pub(crate) fn rating_signals(text: &str) -> usize {
    rating_pattern().find_iter(text).count()
}

/// Number of percentage values in `text`.
pub(crate) fn percent_signals(text: &str) -> usize {
    percent_pattern().find_iter(text).count()
}

/// The default keyword/size/signal validator
#[derive(Debug, Clone)]
pub struct HeuristicValidator {
    thresholds: ValidationThresholds,
}

impl HeuristicValidator {
    pub fn new(thresholds: ValidationThresholds) -> Self {
        Self { thresholds }
    }
}

impl ValidationPolicy for HeuristicValidator {
    fn accept(&self, candidate: &ExtractionCandidate, scope: SelectorScope) -> bool {
        if candidate.is_empty() {
            return false;
        }

        let text = candidate.to_text();
        let min_chars = match scope {
            SelectorScope::Targeted => self.thresholds.min_chars_targeted,
            SelectorScope::Context => self.thresholds.min_chars_context,
        };
        if text.len() < min_chars {
            return false;
        }

        let lower = text.to_lowercase();
        let keyword_hits = DOMAIN_KEYWORDS
            .iter()
            .filter(|keyword| lower.contains(**keyword))
            .count();
        if keyword_hits < self.thresholds.min_keywords {
            return false;
        }

        if self.thresholds.enhanced {
            let signals = rating_signals(&text) + percent_signals(&text);
            if signals < self.thresholds.min_rating_signals {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate_with_text(text: &str) -> ExtractionCandidate {
        ExtractionCandidate::from(json!({ "content": text }))
    }

    #[test]
    fn test_rejects_short_keywordless_candidate() {
        let validator = HeuristicValidator::new(ValidationThresholds::default());
        let candidate = candidate_with_text(&"x".repeat(30));
        assert!(!validator.accept(&candidate, SelectorScope::Targeted));
    }

    #[test]
    fn test_accepts_long_candidate_with_keywords() {
        let validator = HeuristicValidator::new(ValidationThresholds::default());
        let filler = "x".repeat(280);
        let candidate = candidate_with_text(&format!("match score rating {filler}"));
        assert!(validator.accept(&candidate, SelectorScope::Targeted));
    }

    #[test]
    fn test_context_scope_is_looser() {
        let validator = HeuristicValidator::new(ValidationThresholds::default());
        let filler = "x".repeat(110);
        let candidate = candidate_with_text(&format!("timeline player {filler}"));
        assert!(!validator.accept(&candidate, SelectorScope::Targeted));
        assert!(validator.accept(&candidate, SelectorScope::Context));
    }

    #[test]
    fn test_rejects_empty_shapes() {
        let validator = HeuristicValidator::new(ValidationThresholds::default());
        assert!(!validator.accept(&ExtractionCandidate::from(json!({})), SelectorScope::Targeted));
        assert!(!validator.accept(&ExtractionCandidate::from(json!([])), SelectorScope::Context));
        assert!(!validator.accept(&ExtractionCandidate::from(json!(null)), SelectorScope::Context));
    }

    #[test]
    fn test_enhanced_mode_requires_rating_signals() {
        let thresholds = ValidationThresholds {
            enhanced: true,
            ..ValidationThresholds::default()
        };
        let validator = HeuristicValidator::new(thresholds);

        let filler = "x".repeat(280);
        let without_signals = candidate_with_text(&format!("match score rating {filler}"));
        assert!(!validator.accept(&without_signals, SelectorScope::Targeted));

        let with_signals =
            candidate_with_text(&format!("match score rating 7.4 and 6.8 {filler}"));
        assert!(validator.accept(&with_signals, SelectorScope::Targeted));

        let with_percentages =
            candidate_with_text(&format!("match score possession 54% passes 89% {filler}"));
        assert!(validator.accept(&with_percentages, SelectorScope::Targeted));
    }

    #[test]
    fn test_signal_counters() {
        assert_eq!(rating_signals("ratings 7.4, 6.9 and 4.2"), 2);
        assert_eq!(percent_signals("possession 54% accuracy 89%"), 2);
        assert_eq!(rating_signals("minute 10"), 0);
    }
}
