//! Canonical envelope construction
//!
//! Converts an accepted extraction candidate, whatever its shape, into
//! the single normalized record that gets persisted. Normalization is
//! total: any input produces a well-formed envelope with every top-level
//! field present (possibly empty), and it never fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::extract::ExtractionCandidate;

/// Source label recorded in every envelope.
const SOURCE_LABEL: &str = "whoscored-match-centre";

/// Top-level keys that map to `timeline_data`.
const TIMELINE_ALIASES: &[&str] = &[
    "timeline",
    "timeline_data",
    "timeline_ratings",
    "events",
    "extracted_items",
];

/// Top-level keys that map to `summary_stats`.
const STATS_ALIASES: &[&str] = &["stats", "team_stats", "summary_stats"];

/// Keys synthesized into `match_info` when no explicit block exists.
const MATCH_INFO_KEYS: &[&str] = &["home_team", "away_team", "score", "date", "competition"];

/// String tokens treated as absent values during cleaning.
const ABSENT_TOKENS: &[&str] = &["n/a", "null", "none"];

/// Provenance attached to every envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// When the envelope was generated
    pub extracted_at: DateTime<Utc>,

    /// Fixed source identifier
    pub source: String,

    /// Whether extraction succeeded
    pub success: bool,

    /// Shape of the payload before normalization
    pub original_shape: String,
}

/// The single normalized record persisted to disk.
///
/// `match_info`, `timeline_data`, and `summary_stats` are always present;
/// missing source fields degrade to empty containers, never to a missing
/// key. The untouched candidate is retained in `raw_extracted_data` for
/// debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEnvelope {
    /// Team names, score, date, competition
    pub match_info: Map<String, Value>,

    /// Ordered per-minute/per-period records
    pub timeline_data: Vec<Value>,

    /// Aggregate statistics
    pub summary_stats: Map<String, Value>,

    /// Diagnostic string form of a scalar payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,

    /// The original candidate, untouched
    pub raw_extracted_data: Value,

    /// Provenance
    pub extraction_metadata: ExtractionMetadata,
}

/// Build the canonical envelope from an accepted candidate.
pub fn normalize(candidate: ExtractionCandidate) -> MatchEnvelope {
    let raw = candidate.to_value();
    let shape = candidate.shape_name();

    let mut match_info = Map::new();
    let mut timeline_data = Vec::new();
    let mut summary_stats = Map::new();
    let mut raw_data = None;

    match candidate {
        ExtractionCandidate::Mapping(map) => {
            let cleaned = clean_map(map);

            match cleaned.get("match_info") {
                Some(Value::Object(info)) => match_info = info.clone(),
                _ => {
                    // No explicit block: pick up match-level keys from the top.
                    for key in MATCH_INFO_KEYS {
                        if let Some(value) = cleaned.get(*key) {
                            match_info.insert((*key).to_string(), value.clone());
                        }
                    }
                }
            }

            for alias in TIMELINE_ALIASES {
                if let Some(value) = cleaned.get(*alias) {
                    timeline_data = match value {
                        Value::Array(items) => items.clone(),
                        other => vec![other.clone()],
                    };
                    break;
                }
            }

            for alias in STATS_ALIASES {
                if let Some(Value::Object(stats)) = cleaned.get(*alias) {
                    summary_stats = stats.clone();
                    break;
                }
            }
        }
        ExtractionCandidate::Sequence(items) => {
            timeline_data = items.into_iter().filter_map(clean_value).collect();

            // Lists sometimes carry match-level fields inside their entries;
            // lift the first occurrence of each.
            for entry in &timeline_data {
                if let Value::Object(record) = entry {
                    for key in MATCH_INFO_KEYS {
                        if let Some(value) = record.get(*key) {
                            match_info
                                .entry((*key).to_string())
                                .or_insert_with(|| value.clone());
                        }
                    }
                }
            }
        }
        ExtractionCandidate::Scalar(value) => {
            raw_data = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        }
    }

    MatchEnvelope {
        match_info,
        timeline_data,
        summary_stats,
        raw_data,
        raw_extracted_data: raw,
        extraction_metadata: ExtractionMetadata {
            extracted_at: Utc::now(),
            source: SOURCE_LABEL.to_string(),
            success: true,
            original_shape: shape.to_string(),
        },
    }
}

/// Clean one value. Returns None when the value should be treated as
/// absent and its key dropped.
fn clean_value(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(text) => clean_string(text),
        Value::Array(items) => Some(Value::Array(
            items.into_iter().filter_map(clean_value).collect(),
        )),
        Value::Object(map) => Some(Value::Object(clean_map(map))),
        other => Some(other),
    }
}

fn clean_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter(|(key, value)| {
            // A bare `error: false` is a success marker, not data.
            !(key == "error" && *value == Value::Bool(false))
        })
        .filter_map(|(key, value)| clean_value(value).map(|cleaned| (key, cleaned)))
        .collect()
}

fn clean_string(text: String) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() || ABSENT_TOKENS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return None;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Value::from(int));
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if float.is_finite() {
            return Some(Value::from(float));
        }
    }
    Some(Value::String(trimmed.to_string()))
}
