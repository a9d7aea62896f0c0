use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use notelens_core::{
    AnalysisConfig, AnalysisResult, GenerateOptions, GenerateRequest, InferenceProvider, JsonMap,
    ProgressSink, Result,
};

use crate::analyzer::{AnalysisParams, Analyzer, AnalyzerDescriptor, meets_length};

/// Axes scored by the compass, in scoring order.
const AXES: [(&str, &str); 4] = [
    ("passion", "passion and emotional energy"),
    ("logic", "logic and objectivity"),
    ("effort", "effort and diligence"),
    ("growth", "growth and development"),
];

/// Fixed scores used when the backend is unreachable mid-analysis.
const FALLBACK_SCORES: [(&str, u64); 4] =
    [("passion", 7), ("logic", 6), ("effort", 8), ("growth", 5)];

/// Scores content across four fixed axes, one backend call per axis.
///
/// Each axis answer is parsed permissively: a missing or malformed score
/// falls back to a neutral 5 rather than failing the axis. A backend failure
/// partway through degrades the whole analysis to a deterministic synthetic
/// result flagged in metadata, so a flaky local model never blocks the
/// caller.
pub struct CompassAnalyzer {
    provider: Arc<dyn InferenceProvider>,
    dense_min_chars: usize,
    plain_min_chars: usize,
}

struct AxisOutcome {
    score: u64,
    reasoning: String,
}

impl CompassAnalyzer {
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

    fn axis_prompt(content: &str, axis_label: &str) -> String {
        format!(
            "# Instructions\n\
             Analyze the following text and rate the strength of \
             \"{axis_label}\" on a scale of 1 to 10.\n\
             Also give the reason for your rating in about 100 characters.\n\n\
             # Output format example\n\
             {axis_label} strength: 8/10\n\
             reason: (about 100 characters here)\n\n\
             # Text\n\
             {content}"
        )
    }

    fn parse_axis(response: &str, axis_label: &str) -> AxisOutcome {
        let score_pattern = format!(r"(?i){} strength:\s*(\d+)\s*/\s*10", regex::escape(axis_label));
        let score = Regex::new(&score_pattern)
            .ok()
            .and_then(|pattern| pattern.captures(response))
            .and_then(|captures| captures[1].parse::<u64>().ok())
            .map_or(5, |value| value.min(10));

        let reasoning = Regex::new(r"(?im)^reason:\s*(.+)$")
            .ok()
            .and_then(|pattern| pattern.captures(response))
            .map_or_else(
                || "response could not be parsed".to_owned(),
                |captures| captures[1].trim().to_owned(),
            );

        AxisOutcome { score, reasoning }
    }

    fn summary_for(scores: &JsonMap) -> String {
        let mut entries: Vec<(&str, u64)> = scores
            .iter()
            .filter_map(|(axis, value)| value.as_u64().map(|score| (axis.as_str(), score)))
            .collect();
        if entries.is_empty() {
            return "no axis scores available".to_owned();
        }
        entries.sort_by_key(|(_, score)| *score);
        let (weakest_axis, weakest) = entries[0];
        let (strongest_axis, strongest) = entries[entries.len() - 1];

        let total: u64 = entries.iter().map(|(_, score)| score).sum();
        let average = total as f64 / entries.len() as f64;
        let tone = if average >= 7.0 {
            "a very well balanced"
        } else if average >= 5.0 {
            "a balanced"
        } else {
            "a developing"
        };

        format!(
            "This entry shows {tone} state. {strongest_axis} stands out \
             ({strongest}/10) while {weakest_axis} has room to grow ({weakest}/10)."
        )
    }

    fn fallback_result(&self) -> AnalysisResult {
        let mut scores = JsonMap::new();
        let mut reasoning = JsonMap::new();
        let mut total = 0;
        for (axis, score) in FALLBACK_SCORES {
            scores.insert(axis.to_owned(), Value::from(score));
            reasoning.insert(
                axis.to_owned(),
                Value::from(format!("placeholder assessment for {axis}")),
            );
            total += score;
        }

        let summary = Self::summary_for(&scores);
        let mut data = JsonMap::new();
        data.insert("axesScores".to_owned(), Value::Object(scores));
        data.insert("axesReasoning".to_owned(), Value::Object(reasoning));
        data.insert("totalScore".to_owned(), Value::from(total));
        data.insert("compassSummary".to_owned(), Value::from(summary));

        AnalysisResult::success(
            self.name(),
            data,
            format!("compass analysis completed in placeholder mode, total score {total}/40"),
        )
        .with_metadata("fallback", true)
        .with_metadata("testMode", true)
    }
}

#[async_trait]
impl Analyzer for CompassAnalyzer {
    fn name(&self) -> &'static str {
        "sentiment_compass"
    }

    fn descriptor(&self) -> AnalyzerDescriptor {
        AnalyzerDescriptor {
            name: self.name().to_owned(),
            description: "Multi-axis scoring across passion, logic, effort, and growth"
                .to_owned(),
            version: "1.0.0".to_owned(),
            requires_external_service: true,
            max_retries: 0,
            timeout_seconds: 240,
        }
    }

    fn validate(&self, content: &str) -> bool {
        if !meets_length(content, self.dense_min_chars, self.plain_min_chars) {
            return false;
        }
        // Scoring needs prose, not a wall of digits or punctuation.
        let meaningful = content.chars().filter(|c| c.is_alphabetic()).count();
        meaningful >= 20
    }

    async fn analyze_cancelable(
        &self,
        content: &str,
        params: &AnalysisParams,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        progress.emit(10);

        if params.test_mode {
            progress.emit(100);
            return Ok(self.fallback_result());
        }

        let options = GenerateOptions {
            temperature: Some(0.3),
            top_p: Some(0.8),
        };

        let mut scores = JsonMap::new();
        let mut reasoning = JsonMap::new();
        let mut total = 0;

        for (index, (axis, axis_label)) in AXES.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(AnalysisResult::cancelled(self.name()));
            }
            progress.emit(20 + (index * 60 / AXES.len()) as u8);

            let request =
                GenerateRequest::new(params.model_or_default(), Self::axis_prompt(content, axis_label))
                    .with_options(options.clone());

            let response = match self.provider.generate(&request).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(axis, error = %err, "axis scoring failed, degrading to placeholder");
                    progress.emit(100);
                    return Ok(self.fallback_result());
                }
            };

            let outcome = Self::parse_axis(&response, axis_label);
            total += outcome.score;
            scores.insert((*axis).to_owned(), Value::from(outcome.score));
            reasoning.insert((*axis).to_owned(), Value::from(outcome.reasoning));
        }

        progress.emit(95);
        let summary = Self::summary_for(&scores);

        let mut data = JsonMap::new();
        data.insert("axesScores".to_owned(), Value::Object(scores));
        data.insert("axesReasoning".to_owned(), Value::Object(reasoning));
        data.insert("totalScore".to_owned(), Value::from(total));
        data.insert("compassSummary".to_owned(), Value::from(summary));

        progress.emit(100);
        Ok(AnalysisResult::success(
            self.name(),
            data,
            format!("compass analysis completed, total score {total}/40"),
        ))
    }
}
