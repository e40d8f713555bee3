//! Envelope persistence
//!
//! Writes the canonical envelope as pretty-printed UTF-8 JSON and the text
//! summary next to it, with the extension replaced by `_summary.txt`.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::error::Error as CrateError;
use crate::normalize::MatchEnvelope;

/// Error type for persistence operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for CrateError {
    fn from(err: StorageError) -> Self {
        CrateError::Storage(err.to_string())
    }
}

/// Paths written by a successful save
#[derive(Debug, Clone)]
pub struct SavedFiles {
    /// The envelope JSON document
    pub json_path: PathBuf,

    /// The plain-text summary
    pub summary_path: PathBuf,
}

/// Summary path derived from the JSON output path.
pub fn summary_path_for(json_path: &Path) -> PathBuf {
    let stem = json_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("output");
    json_path.with_file_name(format!("{stem}_summary.txt"))
}

/// Write the envelope and its summary to disk.
pub async fn save_envelope(
    envelope: &MatchEnvelope,
    summary: &str,
    json_path: &Path,
) -> Result<SavedFiles, StorageError> {
    if let Some(parent) = json_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let json = serde_json::to_string_pretty(envelope)?;
    fs::write(json_path, json).await?;

    let summary_path = summary_path_for(json_path);
    fs::write(&summary_path, summary).await?;

    info!(
        "saved envelope to {} and summary to {}",
        json_path.display(),
        summary_path.display()
    );

    Ok(SavedFiles {
        json_path: json_path.to_path_buf(),
        summary_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionCandidate;
    use crate::normalize::normalize;
    use serde_json::json;

    #[test]
    fn test_summary_path_replaces_extension() {
        assert_eq!(
            summary_path_for(Path::new("match_timeline_data.json")),
            PathBuf::from("match_timeline_data_summary.txt")
        );
        assert_eq!(
            summary_path_for(Path::new("out/result.json")),
            PathBuf::from("out/result_summary.txt")
        );
    }

    #[tokio::test]
    async fn test_save_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("data.json");

        let envelope = normalize(ExtractionCandidate::from(json!({
            "match_info": {"home_team": "X"},
            "timeline": [{"minute": 1}]
        })));

        let saved = save_envelope(&envelope, "summary text", &json_path)
            .await
            .unwrap();

        let json = fs::read_to_string(&saved.json_path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["match_info"]["home_team"], json!("X"));

        let summary = fs::read_to_string(&saved.summary_path).await.unwrap();
        assert_eq!(summary, "summary text");
    }

    #[tokio::test]
    async fn test_save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("nested/deeper/data.json");

        let envelope = normalize(ExtractionCandidate::from(json!([])));
        let saved = save_envelope(&envelope, "s", &json_path).await.unwrap();

        assert!(saved.json_path.exists());
        assert!(saved.summary_path.exists());
    }
}
