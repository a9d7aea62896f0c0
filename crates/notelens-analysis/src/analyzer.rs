use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use notelens_core::{AnalysisResult, ProgressSink, Result};

/// Static description of an analyzer, returned by [`Analyzer::descriptor`]
/// and exposed through the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerDescriptor {
    /// Unique analyzer name used as the registry key.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Analyzer version string.
    pub version: String,
    /// Whether the analyzer calls out to an inference backend.
    pub requires_external_service: bool,
    /// Retry budget for analyzers that retry.
    pub max_retries: u32,
    /// Soft per-invocation timeout hint in seconds.
    pub timeout_seconds: u64,
}

/// Summary style requested from the summarization analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryType {
    /// Few sentences, most important points only.
    #[default]
    Brief,
    /// Includes background and supporting detail.
    Detailed,
    /// Bullet-point list.
    Bullet,
}

impl SummaryType {
    /// The wire name recorded in result payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brief => "brief",
            Self::Detailed => "detailed",
            Self::Bullet => "bullet",
        }
    }
}

/// Depth of sentiment analysis requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentMode {
    /// Overall polarity and a short justification.
    #[default]
    Basic,
    /// Polarity plus intensity, dominant emotion, and tone.
    Detailed,
    /// Per-emotion strength scores.
    Emotional,
}

impl SentimentMode {
    /// The wire name recorded in result payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Detailed => "detailed",
            Self::Emotional => "emotional",
        }
    }
}

/// Per-invocation analyzer parameters.
///
/// Every field has a default so callers can pass `AnalysisParams::default()`
/// and get the standard behavior of each analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Summary style for the summarization analyzer.
    #[serde(default)]
    pub summary_type: SummaryType,
    /// Sentence budget for summaries.
    #[serde(default = "default_max_sentences")]
    pub max_sentences: u32,
    /// Depth for the sentiment analyzer.
    #[serde(default)]
    pub sentiment_mode: SentimentMode,
    /// Model override; empty or unset means the provider default.
    #[serde(default)]
    pub model: Option<String>,
    /// Forces the compass analyzer to produce its synthetic placeholder
    /// without calling the inference backend.
    #[serde(default)]
    pub test_mode: bool,
}

fn default_max_sentences() -> u32 {
    3
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            summary_type: SummaryType::default(),
            max_sentences: default_max_sentences(),
            sentiment_mode: SentimentMode::default(),
            model: None,
            test_mode: false,
        }
    }
}

impl AnalysisParams {
    /// Resolved model name; empty string means "provider default".
    #[must_use]
    pub fn model_or_default(&self) -> String {
        self.model.clone().unwrap_or_default()
    }
}

/// Length gate that accounts for multi-byte scripts.
///
/// Dense scripts carry more meaning per character, so when the byte count is
/// more than twice the character count the threshold drops to `dense_min`,
/// otherwise `plain_min` applies.
#[must_use]
pub fn meets_length(content: &str, dense_min: usize, plain_min: usize) -> bool {
    let trimmed = content.trim();
    let char_count = trimmed.chars().count();
    let byte_count = trimmed.len();
    let min_chars = if byte_count > char_count * 2 {
        dense_min
    } else {
        plain_min
    };
    char_count >= min_chars
}

/// A content analyzer.
///
/// Implementations propagate backend failures as `Err`; the registry converts
/// those into failure results at its boundary. Observed cancellation is not an
/// error and is returned as `Ok(AnalysisResult::cancelled(..))`.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Unique analyzer name; doubles as the registry key.
    fn name(&self) -> &'static str;

    /// Static descriptor for listings.
    fn descriptor(&self) -> AnalyzerDescriptor;

    /// Whether the content is long and meaningful enough to analyze.
    fn validate(&self, content: &str) -> bool;

    /// Runs the analysis to completion without progress or cancellation.
    async fn analyze(&self, content: &str, params: &AnalysisParams) -> Result<AnalysisResult> {
        self.analyze_cancelable(
            content,
            params,
            &ProgressSink::disabled(),
            &CancellationToken::new(),
        )
        .await
    }

    /// Runs the analysis with progress milestones and cooperative
    /// cancellation, checked before the first external call and at every
    /// retry or per-axis boundary.
    async fn analyze_cancelable(
        &self,
        content: &str,
        params: &AnalysisParams,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_uses_plain_threshold() {
        let short = "tiny note text here";
        assert!(!meets_length(short, 20, 30));
        let long = "this note is comfortably longer than thirty characters";
        assert!(meets_length(long, 20, 30));
    }

    #[test]
    fn dense_text_uses_lower_threshold() {
        // 20 CJK characters, 60 bytes.
        let dense = "今日はとても良い一日でした明日も頑張ります";
        assert!(dense.len() > dense.chars().count() * 2);
        assert!(meets_length(dense, 20, 30));
    }

    #[test]
    fn params_default_sentences() {
        let params: AnalysisParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.max_sentences, 3);
        assert_eq!(params.summary_type, SummaryType::Brief);
        assert!(!params.test_mode);
    }

    #[test]
    fn summary_type_round_trips() {
        let bullet: SummaryType = serde_json::from_str("\"bullet\"").unwrap();
        assert_eq!(bullet, SummaryType::Bullet);
        assert_eq!(bullet.as_str(), "bullet");
    }
}
