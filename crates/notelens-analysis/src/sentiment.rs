use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use notelens_core::{
    AnalysisConfig, AnalysisResult, GenerateRequest, InferenceProvider, JsonMap, ProgressSink,
    Result,
};

use crate::analyzer::{AnalysisParams, Analyzer, AnalyzerDescriptor, SentimentMode, meets_length};

/// Emotion keywords scanned for in the model's answer.
const EMOTION_KEYWORDS: [(&str, &[&str]); 5] = [
    ("joy", &["joy", "happy", "happiness", "delight", "cheerful"]),
    ("sadness", &["sadness", "sad", "sorrow", "grief", "melancholy"]),
    ("anger", &["anger", "angry", "furious", "irritated", "frustration"]),
    ("fear", &["fear", "afraid", "anxiety", "anxious", "worried"]),
    ("surprise", &["surprise", "surprised", "astonished", "unexpected"]),
];

/// Analyzes emotional tone with a single backend call.
///
/// The model answers in prose; the parse is a keyword scan rather than a
/// strict format, so a slightly off-format answer still yields a usable
/// polarity. The full answer is preserved under `rawAnalysis`.
pub struct SentimentAnalyzer {
    provider: Arc<dyn InferenceProvider>,
    dense_min_chars: usize,
    plain_min_chars: usize,
}

impl SentimentAnalyzer {
    /// Creates the analyzer with default thresholds.
    #[must_use]
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self::with_config(provider, &AnalysisConfig::default())
    }

    /// Creates the analyzer with configured validation thresholds.
    #[must_use]
    pub fn with_config(provider: Arc<dyn InferenceProvider>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            dense_min_chars: config.dense_min_chars,
            plain_min_chars: config.plain_min_chars,
        }
    }

    fn prompt_for(content: &str, mode: SentimentMode) -> String {
        match mode {
            SentimentMode::Detailed => format!(
                "Analyze the sentiment of the following text in detail. \
                 Answer in this format:\n\n\
                 Overall sentiment: [positive/negative/neutral]\n\
                 Intensity: [weak/moderate/strong]\n\
                 Dominant emotion: [joy/sadness/anger/fear/surprise/other]\n\
                 Tone: [formal/casual/passionate/calm/other]\n\n\
                 Text: \"{content}\""
            ),
            SentimentMode::Emotional => format!(
                "Analyze the emotions present in the following text and rate \
                 the strength of each. Answer in this format:\n\n\
                 Joy: [0-10]\n\
                 Sadness: [0-10]\n\
                 Anger: [0-10]\n\
                 Fear: [0-10]\n\
                 Surprise: [0-10]\n\
                 Overall impression: [one phrase]\n\n\
                 Text: \"{content}\""
            ),
            SentimentMode::Basic => format!(
                "Analyze the sentiment of the following text. Answer with \
                 \"positive\", \"negative\", or \"neutral\", followed by a \
                 brief explanation.\n\n\
                 Text: \"{content}\""
            ),
        }
    }

    fn parse_response(response: &str, mode: SentimentMode) -> JsonMap {
        let lower = response.to_lowercase();

        let overall = if ["positive", "upbeat", "optimistic"]
            .iter()
            .any(|word| lower.contains(word))
        {
            "positive"
        } else if ["negative", "pessimistic", "gloomy"]
            .iter()
            .any(|word| lower.contains(word))
        {
            "negative"
        } else {
            "neutral"
        };

        let emotions: Vec<Value> = EMOTION_KEYWORDS
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|word| lower.contains(word)))
            .map(|(emotion, _)| Value::from(*emotion))
            .collect();

        let intensity = if ["strong", "intense", "overwhelming"]
            .iter()
            .any(|word| lower.contains(word))
        {
            "strong"
        } else if ["weak", "mild", "faint"].iter().any(|word| lower.contains(word)) {
            "weak"
        } else {
            "moderate"
        };

        let mut data = JsonMap::new();
        data.insert("overallSentiment".to_owned(), Value::from(overall));
        data.insert("emotionsDetected".to_owned(), Value::Array(emotions));
        data.insert("intensity".to_owned(), Value::from(intensity));
        data.insert("analysisType".to_owned(), Value::from(mode.as_str()));
        data.insert("rawAnalysis".to_owned(), Value::from(response));
        data
    }
}

#[async_trait]
impl Analyzer for SentimentAnalyzer {
    fn name(&self) -> &'static str {
        "sentiment"
    }

    fn descriptor(&self) -> AnalyzerDescriptor {
        AnalyzerDescriptor {
            name: self.name().to_owned(),
            description: "Analyze emotional tone and sentiment of content".to_owned(),
            version: "1.0.0".to_owned(),
            requires_external_service: true,
            max_retries: 0,
            timeout_seconds: 60,
        }
    }

    fn validate(&self, content: &str) -> bool {
        meets_length(content, self.dense_min_chars, self.plain_min_chars)
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

        let prompt = Self::prompt_for(content, params.sentiment_mode);
        let request = GenerateRequest::new(params.model_or_default(), prompt);

        progress.emit(60);
        let response = self.provider.generate(&request).await?;
        progress.emit(90);

        let mut data = Self::parse_response(response.trim(), params.sentiment_mode);
        data.insert(
            "contentLength".to_owned(),
            Value::from(content.chars().count()),
        );
        let overall = data
            .get("overallSentiment")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_owned();

        progress.emit(100);
        Ok(AnalysisResult::success(
            self.name(),
            data,
            format!("sentiment analysis completed ({overall})"),
        ))
    }
}
