//! Batch analysis over note collections.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use notelens_analysis::{AnalysisParams, AnalyzerRegistry};
use notelens_core::{
    BatchItemOutcome, BatchProgressSink, BatchReport, NoteRecord, NoteStatus, StoredAnalysis,
};

use crate::store::{MetadataStore, NoteStore};

/// The batch task types the coordinator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchTask {
    /// Tag active notes that have no tags yet.
    TagUntagged,
    /// Summarize active notes with no stored summary.
    SummarizeMissing,
    /// Tag archived notes that have no tags yet.
    TagUntaggedArchived,
    /// Summarize archived notes with no stored summary.
    SummarizeMissingArchived,
}

impl BatchTask {
    /// Parses the wire name of a task type.
    #[must_use]
    pub fn parse(task_type: &str) -> Option<Self> {
        match task_type {
            "tag_untagged" => Some(Self::TagUntagged),
            "summarize_missing" => Some(Self::SummarizeMissing),
            "tag_untagged_archived" => Some(Self::TagUntaggedArchived),
            "summarize_missing_archived" => Some(Self::SummarizeMissingArchived),
            _ => None,
        }
    }

    /// The analyzer this task runs.
    #[must_use]
    pub fn analyzer(self) -> &'static str {
        match self {
            Self::TagUntagged | Self::TagUntaggedArchived => "tagging",
            Self::SummarizeMissing | Self::SummarizeMissingArchived => "summarization",
        }
    }

    /// Status line label shown while the task runs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::TagUntagged => "tagging untagged notes",
            Self::SummarizeMissing => "summarizing notes",
            Self::TagUntaggedArchived => "tagging archived notes",
            Self::SummarizeMissingArchived => "summarizing archived notes",
        }
    }

    fn status(self) -> NoteStatus {
        match self {
            Self::TagUntagged | Self::SummarizeMissing => NoteStatus::Active,
            Self::TagUntaggedArchived | Self::SummarizeMissingArchived => NoteStatus::Archived,
        }
    }

    fn wants(self, record: &NoteRecord) -> bool {
        if record.status != self.status() {
            return false;
        }
        match self.analyzer() {
            "tagging" => record.tags.is_empty(),
            analyzer => !record.has_analysis(analyzer),
        }
    }
}

/// Walks a note collection and applies one analyzer per note.
///
/// Items run sequentially; one note's failure never stops the run. The
/// report's counters treat unreadable notes as processed failures so a run
/// over N targets always accounts for all N unless cancelled.
pub struct BatchCoordinator {
    registry: Arc<AnalyzerRegistry>,
    metadata: Arc<dyn MetadataStore>,
    notes: Arc<dyn NoteStore>,
}

impl BatchCoordinator {
    /// Creates a coordinator over a registry and the two stores.
    #[must_use]
    pub fn new(
        registry: Arc<AnalyzerRegistry>,
        metadata: Arc<dyn MetadataStore>,
        notes: Arc<dyn NoteStore>,
    ) -> Self {
        Self {
            registry,
            metadata,
            notes,
        }
    }

    /// The notes a task would process, in stable index order.
    #[must_use]
    pub fn select_targets(&self, task: BatchTask) -> Vec<NoteRecord> {
        self.metadata.search(&|record| task.wants(record))
    }

    /// Runs a batch task to completion or cancellation.
    pub async fn run(
        &self,
        task_type: &str,
        progress: &BatchProgressSink,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let Some(task) = BatchTask::parse(task_type) else {
            return BatchReport::empty(false, format!("unknown batch task type: {task_type}"));
        };

        let targets = self.select_targets(task);
        if targets.is_empty() {
            return BatchReport::empty(true, format!("no targets for {}", task.label()));
        }

        info!(task = task.label(), targets = targets.len(), "batch run started");

        let total = targets.len();
        let mut details: Vec<BatchItemOutcome> = Vec::with_capacity(total);
        let mut success_count = 0;
        let mut failed_count = 0;

        for record in targets {
            if cancel.is_cancelled() {
                let processed = details.len();
                info!(task = task.label(), processed, "batch run cancelled");
                return BatchReport {
                    success: false,
                    processed_count: processed,
                    success_count,
                    failed_count,
                    cancelled: true,
                    message: format!(
                        "{} cancelled after {processed} of {total} notes",
                        task.label()
                    ),
                    details,
                };
            }

            let outcome = self.process_one(task, &record).await;
            if outcome.success {
                success_count += 1;
            } else {
                failed_count += 1;
            }
            details.push(outcome);

            let processed = details.len();
            let percent = ((processed as f64 / total as f64) * 100.0).round() as u8;
            progress.emit(
                percent,
                &format!("{}... ({processed}/{total})", task.label()),
            );
        }

        let message = if failed_count == 0 {
            format!("{} completed, {success_count} notes processed", task.label())
        } else {
            format!(
                "{} completed with {failed_count} failures ({success_count} succeeded)",
                task.label()
            )
        };

        BatchReport {
            success: failed_count == 0,
            processed_count: details.len(),
            success_count,
            failed_count,
            cancelled: false,
            message,
            details,
        }
    }

    async fn process_one(&self, task: BatchTask, record: &NoteRecord) -> BatchItemOutcome {
        let content = match self.notes.read(&record.path) {
            Ok(content) => content,
            Err(err) => {
                warn!(note = %record.title, error = %err, "note read failed");
                return BatchItemOutcome {
                    item: record.title.clone(),
                    success: false,
                    message: format!("read error: {err}"),
                };
            }
        };

        let result = self
            .registry
            .analyze(task.analyzer(), &content, &AnalysisParams::default())
            .await;

        if !result.success {
            return BatchItemOutcome {
                item: record.title.clone(),
                success: false,
                message: result.message,
            };
        }

        if let Err(err) = self.persist(task, record, &result.data, result.processing_time_seconds)
        {
            warn!(note = %record.title, error = %err, "failed to persist analysis");
            return BatchItemOutcome {
                item: record.title.clone(),
                success: false,
                message: format!("persist error: {err}"),
            };
        }

        BatchItemOutcome {
            item: record.title.clone(),
            success: true,
            message: result.message,
        }
    }

    fn persist(
        &self,
        task: BatchTask,
        record: &NoteRecord,
        data: &notelens_core::JsonMap,
        processing_time_seconds: f64,
    ) -> notelens_core::Result<()> {
        // Re-read the record in case an earlier item in this run touched it.
        let mut current = self
            .metadata
            .get(&record.path)
            .unwrap_or_else(|| record.clone());

        if task.analyzer() == "tagging" {
            current.tags = data
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default();
        } else {
            current.analyses.insert(
                task.analyzer().to_owned(),
                StoredAnalysis {
                    data: data.clone(),
                    timestamp: Utc::now(),
                    processing_time_seconds,
                },
            );
        }

        self.metadata.upsert(current)
    }
}
