use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use notelens_core::{
    AnalysisConfig, AnalysisResult, GenerateRequest, InferenceProvider, JsonMap, ProgressSink,
    Result,
};

use crate::analyzer::{AnalysisParams, Analyzer, AnalyzerDescriptor, SummaryType};

/// Generates a summary of the content in one of three styles.
///
/// A summary that comes back longer than `max_summary_length` gets exactly
/// one compression pass asking for a shorter rewrite; whatever that second
/// call returns is kept as-is.
pub struct SummarizationAnalyzer {
    provider: Arc<dyn InferenceProvider>,
    max_summary_length: usize,
    compressed_length: usize,
    min_content_length: usize,
}

impl SummarizationAnalyzer {
    /// Creates the analyzer with default thresholds.
    #[must_use]
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self::with_config(provider, &AnalysisConfig::default())
    }

    /// Creates the analyzer with configured thresholds.
    #[must_use]
    pub fn with_config(provider: Arc<dyn InferenceProvider>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            max_summary_length: config.max_summary_length,
            compressed_length: config.compressed_summary_length,
            min_content_length: config.min_summary_content,
        }
    }

    fn prompt_for(content: &str, summary_type: SummaryType, max_sentences: u32) -> String {
        match summary_type {
            SummaryType::Bullet => format!(
                "Summarize the following text as {max_sentences} bullet points. \
                 Start each point with \"- \".\n\nText: \"{content}\""
            ),
            SummaryType::Detailed => format!(
                "Summarize the following text in detail in at most {max_sentences} sentences. \
                 Include the key points and relevant background.\n\nText: \"{content}\""
            ),
            SummaryType::Brief => format!(
                "Summarize the following text concisely in at most {max_sentences} sentences. \
                 Include only the most important points.\n\nText: \"{content}\""
            ),
        }
    }
}

#[async_trait]
impl Analyzer for SummarizationAnalyzer {
    fn name(&self) -> &'static str {
        "summarization"
    }

    fn descriptor(&self) -> AnalyzerDescriptor {
        AnalyzerDescriptor {
            name: self.name().to_owned(),
            description: "Generate concise summaries of content".to_owned(),
            version: "1.0.0".to_owned(),
            requires_external_service: true,
            max_retries: 0,
            timeout_seconds: 120,
        }
    }

    fn validate(&self, content: &str) -> bool {
        content.trim().chars().count() >= self.min_content_length
    }

    async fn analyze_cancelable(
        &self,
        content: &str,
        params: &AnalysisParams,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        progress.emit(10);
        if cancel.is_cancelled() {
            return Ok(AnalysisResult::cancelled(self.name()));
        }
        progress.emit(30);

        let prompt = Self::prompt_for(content, params.summary_type, params.max_sentences);
        let request = GenerateRequest::new(params.model_or_default(), prompt);

        progress.emit(60);
        let mut summary = self.provider.generate(&request).await?.trim().to_owned();
        progress.emit(90);

        if summary.chars().count() > self.max_summary_length {
            debug!(
                length = summary.chars().count(),
                "summary too long, requesting compression"
            );
            if cancel.is_cancelled() {
                return Ok(AnalysisResult::cancelled(self.name()));
            }
            let shorter_prompt = format!(
                "Rewrite the following summary even more briefly, \
                 in at most {} characters:\n{summary}",
                self.compressed_length
            );
            let shorter = GenerateRequest::new(params.model_or_default(), shorter_prompt);
            summary = self.provider.generate(&shorter).await?.trim().to_owned();
        }

        let original_length = content.chars().count();
        let summary_length = summary.chars().count();
        let ratio = if original_length == 0 {
            0.0
        } else {
            (summary_length as f64 / original_length as f64 * 100.0).round() / 100.0
        };

        let mut data = JsonMap::new();
        data.insert("summary".to_owned(), Value::from(summary));
        data.insert(
            "summaryType".to_owned(),
            Value::from(params.summary_type.as_str()),
        );
        data.insert("originalLength".to_owned(), Value::from(original_length));
        data.insert("summaryLength".to_owned(), Value::from(summary_length));
        data.insert("compressionRatio".to_owned(), Value::from(ratio));

        progress.emit(100);
        Ok(AnalysisResult::success(
            self.name(),
            data,
            format!("summary generated ({summary_length} chars)"),
        ))
    }
}
