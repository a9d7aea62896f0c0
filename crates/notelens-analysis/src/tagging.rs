use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use notelens_core::{
    AnalysisConfig, AnalysisResult, GenerateRequest, InferenceProvider, JsonMap, ProgressSink,
    Result,
};

use crate::analyzer::{AnalysisParams, Analyzer, AnalyzerDescriptor};

/// Extracts keyword tags from content.
///
/// The backend sometimes answers a tag request with prose instead of a short
/// comma-separated list. When the response exceeds `max_tags_length`, that
/// response becomes the next attempt's input: each retry summarizes the
/// previous over-long answer, converging toward a short list. Exhausting the
/// retry budget is a successful outcome with zero tags, not an error.
pub struct TaggingAnalyzer {
    provider: Arc<dyn InferenceProvider>,
    max_tags_length: usize,
    max_retries: u32,
}

impl TaggingAnalyzer {
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
            max_tags_length: config.max_tags_length,
            max_retries: config.max_tag_retries.max(1),
        }
    }

    fn prompt_for(content: &str) -> String {
        format!(
            "Extract 5 to 8 of the main keywords from the following text, \
             as comma-separated words only.\n\
             Example output: \"rust, async, database, tooling\"\n\
             Text: \"{content}\""
        )
    }
}

#[async_trait]
impl Analyzer for TaggingAnalyzer {
    fn name(&self) -> &'static str {
        "tagging"
    }

    fn descriptor(&self) -> AnalyzerDescriptor {
        AnalyzerDescriptor {
            name: self.name().to_owned(),
            description: "Extract relevant tags and keywords from content".to_owned(),
            version: "1.0.0".to_owned(),
            requires_external_service: true,
            max_retries: self.max_retries,
            timeout_seconds: 60,
        }
    }

    fn validate(&self, content: &str) -> bool {
        content.trim().chars().count() > 10
    }

    async fn analyze_cancelable(
        &self,
        content: &str,
        params: &AnalysisParams,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        progress.emit(10);

        let mut current = content.to_owned();
        let progress_step = 70 / self.max_retries.max(1) as u8;

        for attempt in 0..self.max_retries {
            if cancel.is_cancelled() {
                return Ok(AnalysisResult::cancelled(self.name()));
            }
            progress.emit(20 + attempt as u8 * progress_step);
            debug!(attempt = attempt + 1, "tag generation attempt");

            let request = GenerateRequest::new(params.model_or_default(), Self::prompt_for(&current));
            let raw = self.provider.generate(&request).await?;
            let raw = raw.trim().to_owned();

            if raw.chars().count() <= self.max_tags_length {
                let tags: Vec<Value> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(Value::from)
                    .collect();
                let count = tags.len();

                let mut data = JsonMap::new();
                data.insert("tags".to_owned(), Value::Array(tags));

                progress.emit(100);
                return Ok(AnalysisResult::success(
                    self.name(),
                    data,
                    format!("extracted {count} tags"),
                ));
            }

            warn!(
                attempt = attempt + 1,
                length = raw.chars().count(),
                "tag response too long, retrying with response as input"
            );
            current = raw;
        }

        // Retry budget spent without a short answer. Skip tagging rather
        // than failing the whole analysis.
        let mut data = JsonMap::new();
        data.insert("tags".to_owned(), Value::Array(Vec::new()));
        progress.emit(100);
        Ok(AnalysisResult::success(
            self.name(),
            data,
            format!("no tags after {} attempts", self.max_retries),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    fn long_reply() -> String {
        "word ".repeat(30)
    }

    #[tokio::test]
    async fn short_response_parses_on_first_attempt() {
        let provider = Arc::new(ScriptedProvider::new(["rust, async, tooling"]));
        let analyzer = TaggingAnalyzer::new(Arc::clone(&provider) as Arc<dyn InferenceProvider>);

        let result = analyzer
            .analyze("a note about rust async tooling", &AnalysisParams::default())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(provider.call_count(), 1);
        let tags = result.data.get("tags").and_then(Value::as_array).unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0], "rust");
        assert_eq!(result.message, "extracted 3 tags");
    }

    #[tokio::test]
    async fn oversized_responses_escalate_then_parse() {
        let provider = Arc::new(ScriptedProvider::new([
            long_reply(),
            long_reply(),
            "alpha, beta, gamma".to_owned(),
        ]));
        let analyzer = TaggingAnalyzer::new(Arc::clone(&provider) as Arc<dyn InferenceProvider>);

        let result = analyzer
            .analyze("content long enough to tag", &AnalysisParams::default())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(provider.call_count(), 3);
        let tags = result.data.get("tags").and_then(Value::as_array).unwrap();
        assert_eq!(tags.len(), 3);

        // Attempt 2 and 3 feed the previous over-long answer back in.
        let prompts = provider.prompts();
        assert!(prompts[1].contains(long_reply().trim()));
    }

    #[tokio::test]
    async fn exhaustion_succeeds_with_empty_tags() {
        let provider = Arc::new(ScriptedProvider::repeating(long_reply()));
        let analyzer = TaggingAnalyzer::new(Arc::clone(&provider) as Arc<dyn InferenceProvider>);

        let result = analyzer
            .analyze("content long enough to tag", &AnalysisParams::default())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(provider.call_count(), 3);
        let tags = result.data.get("tags").and_then(Value::as_array).unwrap();
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let provider: Arc<dyn InferenceProvider> =
            Arc::new(ScriptedProvider::new(Vec::<String>::new()));
        let analyzer = TaggingAnalyzer::new(provider);

        let err = analyzer
            .analyze("content long enough to tag", &AnalysisParams::default())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits() {
        let provider = Arc::new(ScriptedProvider::repeating("rust, async"));
        let analyzer = TaggingAnalyzer::new(Arc::clone(&provider) as Arc<dyn InferenceProvider>);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = analyzer
            .analyze_cancelable(
                "content long enough to tag",
                &AnalysisParams::default(),
                &ProgressSink::disabled(),
                &cancel,
            )
            .await
            .unwrap();

        assert!(result.is_cancelled());
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn validation_requires_more_than_ten_chars() {
        let provider: Arc<dyn InferenceProvider> = Arc::new(ScriptedProvider::repeating("x"));
        let analyzer = TaggingAnalyzer::new(provider);
        assert!(!analyzer.validate("short"));
        assert!(analyzer.validate("long enough to be tagged"));
    }
}
