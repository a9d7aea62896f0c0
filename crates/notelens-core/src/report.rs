use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::JsonMap;

/// Per-item outcome recorded during a batch run, in processing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemOutcome {
    /// Display title of the processed item.
    pub item: String,
    /// Whether this item was processed successfully.
    pub success: bool,
    /// Human-readable outcome for this item.
    pub message: String,
}

/// Aggregate outcome of a batch run.
///
/// `processed_count == success_count + failed_count` holds unless the run was
/// cancelled early, in which case the counts reflect only items handled
/// before the cancellation was observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Whether every processed item succeeded and the run was not cancelled.
    pub success: bool,
    /// Number of items handled (including per-item failures).
    pub processed_count: usize,
    /// Number of items that succeeded.
    pub success_count: usize,
    /// Number of items that failed.
    pub failed_count: usize,
    /// Whether the run terminated early via cancellation.
    pub cancelled: bool,
    /// Summary message for the whole run.
    pub message: String,
    /// One entry per processed item, in processing order.
    pub details: Vec<BatchItemOutcome>,
}

impl BatchReport {
    /// Creates an empty report carrying only a summary message.
    pub fn empty<M: Into<String>>(success: bool, message: M) -> Self {
        Self {
            success,
            processed_count: 0,
            success_count: 0,
            failed_count: 0,
            cancelled: false,
            message: message.into(),
            details: Vec::new(),
        }
    }
}

/// Lifecycle state of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    /// The note lives in the active notes directory.
    #[default]
    Active,
    /// The note has been moved to the archive directory.
    Archived,
}

/// Stored payload of one past analyzer run on a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalysis {
    /// The analyzer's result payload.
    pub data: JsonMap,
    /// When the analysis ran.
    pub timestamp: DateTime<Utc>,
    /// How long the analysis took.
    pub processing_time_seconds: f64,
}

/// Metadata-store document describing one note file.
///
/// Legacy records may lack `status`, `order_index`, or `analyses`; serde
/// defaults treat them as active, unordered, and unanalyzed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    /// Display title, normally the file name.
    pub title: String,
    /// Absolute path of the note file; unique key within a store.
    pub path: PathBuf,
    /// User- or analyzer-assigned tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Lifecycle state.
    #[serde(default)]
    pub status: NoteStatus,
    /// Display ordering; fresh records get `max(existing) + 1`.
    #[serde(default)]
    pub order_index: i64,
    /// Persisted analyzer results, keyed by analyzer name.
    #[serde(default)]
    pub analyses: BTreeMap<String, StoredAnalysis>,
}

impl NoteRecord {
    /// Creates a record for the given path with the title taken from the
    /// file name.
    pub fn new(path: &Path, status: NoteStatus) -> Self {
        let title = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| {
                name.to_string_lossy().into_owned()
            });
        Self {
            title,
            path: path.to_path_buf(),
            tags: Vec::new(),
            status,
            order_index: 0,
            analyses: BTreeMap::new(),
        }
    }

    /// Whether a result from the named analyzer has been stored on this note.
    pub fn has_analysis(&self, analyzer: &str) -> bool {
        self.analyses.contains_key(analyzer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_balance() {
        let report = BatchReport {
            success: false,
            processed_count: 3,
            success_count: 2,
            failed_count: 1,
            cancelled: false,
            message: "completed with 1 failure".to_owned(),
            details: Vec::new(),
        };
        assert_eq!(
            report.processed_count,
            report.success_count + report.failed_count
        );
    }

    #[test]
    fn record_title_from_file_name() {
        let record = NoteRecord::new(Path::new("/notes/journal.md"), NoteStatus::Active);
        assert_eq!(record.title, "journal.md");
        assert_eq!(record.status, NoteStatus::Active);
        assert!(record.tags.is_empty());
        assert!(!record.has_analysis("summarization"));
    }

    #[test]
    fn legacy_record_defaults() {
        let json = r#"{"title": "old.md", "path": "/notes/old.md"}"#;
        let record: NoteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, NoteStatus::Active);
        assert_eq!(record.order_index, 0);
        assert!(record.analyses.is_empty());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&NoteStatus::Archived).unwrap();
        assert_eq!(json, "\"archived\"");
    }
}
