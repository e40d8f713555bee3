//! Human-readable summary reports
//!
//! Renders a canonical envelope into the fixed-layout text report written
//! next to the JSON output. Deterministic for a given envelope.

use serde_json::Value;

use crate::normalize::MatchEnvelope;

const RULE: &str = "========================================";

/// Longest first-entry preview included in the report.
const PREVIEW_LIMIT: usize = 200;

/// Render the plain-text summary for an envelope.
pub fn build_summary_report(envelope: &MatchEnvelope) -> String {
    let mut out = String::new();
    let meta = &envelope.extraction_metadata;

    out.push_str(RULE);
    out.push_str("\n MATCH TIMELINE EXTRACTION REPORT\n");
    out.push_str(RULE);
    out.push_str("\n\n");

    out.push_str(&format!(
        "Extracted at:  {}\n",
        meta.extracted_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("Source:        {}\n", meta.source));
    out.push_str(&format!(
        "Status:        {}\n",
        if meta.success { "success" } else { "failed" }
    ));
    out.push_str(&format!("Payload shape: {}\n\n", meta.original_shape));

    out.push_str("-- Match information --\n");
    if envelope.match_info.is_empty() {
        out.push_str("(no match information captured)\n");
    } else {
        for (key, value) in &envelope.match_info {
            out.push_str(&format!("{key}: {}\n", render_scalar(value)));
        }
    }
    out.push('\n');

    out.push_str("-- Timeline --\n");
    out.push_str(&format!("entries: {}\n", envelope.timeline_data.len()));
    if let Some(first) = envelope.timeline_data.first() {
        out.push_str(&format!("first entry: {}\n", preview(first)));
    }
    out.push('\n');

    out.push_str("-- Summary statistics --\n");
    out.push_str(&format!("fields: {}\n\n", envelope.summary_stats.len()));

    out.push_str("-- Raw extraction --\n");
    out.push_str(&format!(
        "top-level fields: {}\n",
        raw_field_count(&envelope.raw_extracted_data)
    ));
    if let Some(raw) = &envelope.raw_data {
        out.push_str(&format!("raw data: {}\n", truncate(raw)));
    }
    out.push('\n');

    out.push_str(&format!(
        "Report complete: {} timeline entries extracted.\n",
        envelope.timeline_data.len()
    ));

    out
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn preview(value: &Value) -> String {
    truncate(&value.to_string())
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= PREVIEW_LIMIT {
        text.to_string()
    } else {
        let cut: String = text.chars().take(PREVIEW_LIMIT).collect();
        format!("{cut}...")
    }
}

fn raw_field_count(raw: &Value) -> usize {
    match raw {
        Value::Object(map) => map.len(),
        Value::Array(items) => items.len(),
        Value::Null => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionCandidate;
    use crate::normalize::normalize;
    use serde_json::json;

    fn sample_envelope() -> MatchEnvelope {
        normalize(ExtractionCandidate::from(json!({
            "match_info": {"home_team": "Forest", "away_team": "Brentford", "score": "2-1"},
            "timeline": [{"minute": 10, "rating": 6.5}, {"minute": 20, "rating": 7.1}],
            "stats": {"possession": 55}
        })))
    }

    #[test]
    fn test_report_contains_all_blocks() {
        let report = build_summary_report(&sample_envelope());
        assert!(report.contains("MATCH TIMELINE EXTRACTION REPORT"));
        assert!(report.contains("home_team: Forest"));
        assert!(report.contains("entries: 2"));
        assert!(report.contains("fields: 1"));
        assert!(report.contains("Report complete: 2 timeline entries extracted."));
    }

    #[test]
    fn test_report_handles_empty_envelope() {
        let envelope = normalize(ExtractionCandidate::from(json!(null)));
        let report = build_summary_report(&envelope);
        assert!(report.contains("(no match information captured)"));
        assert!(report.contains("entries: 0"));
    }

    #[test]
    fn test_report_is_deterministic() {
        let envelope = sample_envelope();
        assert_eq!(
            build_summary_report(&envelope),
            build_summary_report(&envelope)
        );
    }

    #[test]
    fn test_first_entry_preview_is_truncated() {
        let long_note = "x".repeat(500);
        let envelope = normalize(ExtractionCandidate::from(json!({
            "timeline": [{"note": long_note}]
        })));
        let report = build_summary_report(&envelope);
        let preview_line = report
            .lines()
            .find(|line| line.starts_with("first entry:"))
            .unwrap();
        assert!(preview_line.len() < 300);
        assert!(preview_line.ends_with("..."));
    }
}
