use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON object map used for analyzer payloads and metadata.
pub type JsonMap = Map<String, Value>;

/// Outcome of a single analyzer invocation.
///
/// Constructed once per invocation and never mutated afterwards; the registry
/// stamps the wall-clock duration as the final construction step. A failed
/// result always carries an empty `data` map, and `message` is non-empty in
/// every case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Whether the analysis completed successfully.
    pub success: bool,
    /// Analyzer-specific payload (tags, summary, axis scores, ...).
    pub data: JsonMap,
    /// Human-readable status or error message.
    pub message: String,
    /// Wall-clock duration of the invocation in seconds.
    pub processing_time_seconds: f64,
    /// Name of the analyzer that produced this result.
    pub analyzer_name: String,
    /// Diagnostic extras (`errorType`, `contentLength`, ...).
    #[serde(default)]
    pub metadata: JsonMap,
}

impl AnalysisResult {
    /// Creates a successful result with the given payload.
    ///
    /// Records the payload's serialized length under `metadata.contentLength`.
    pub fn success<M: Into<String>>(analyzer: &str, data: JsonMap, message: M) -> Self {
        let mut metadata = JsonMap::new();
        let content_length = Value::Object(data.clone()).to_string().len();
        metadata.insert("contentLength".to_owned(), Value::from(content_length));

        Self {
            success: true,
            data,
            message: non_empty(message.into(), "analysis completed"),
            processing_time_seconds: 0.0,
            analyzer_name: analyzer.to_owned(),
            metadata,
        }
    }

    /// Creates a failed result. The payload is always empty on failure.
    pub fn failure<M: Into<String>>(analyzer: &str, message: M) -> Self {
        Self {
            success: false,
            data: JsonMap::new(),
            message: non_empty(message.into(), "analysis failed"),
            processing_time_seconds: 0.0,
            analyzer_name: analyzer.to_owned(),
            metadata: JsonMap::new(),
        }
    }

    /// Creates the failure result used when cooperative cancellation is
    /// observed mid-analysis.
    pub fn cancelled(analyzer: &str) -> Self {
        Self::failure(analyzer, "analysis cancelled").with_metadata("errorType", "Cancelled")
    }

    /// Attaches a metadata entry.
    #[must_use]
    pub fn with_metadata<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }

    /// Stamps the measured wall-clock duration.
    #[must_use]
    pub fn with_processing_time(mut self, seconds: f64) -> Self {
        self.processing_time_seconds = seconds;
        self
    }

    /// Whether this result represents an observed cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.metadata
            .get("errorType")
            .and_then(Value::as_str)
            .is_some_and(|kind| kind == "Cancelled")
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_owned()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_has_empty_data() {
        let result = AnalysisResult::failure("tagging", "boom");
        assert!(!result.success);
        assert!(result.data.is_empty());
        assert_eq!(result.analyzer_name, "tagging");
    }

    #[test]
    fn message_never_empty() {
        let failed = AnalysisResult::failure("tagging", "");
        assert_eq!(failed.message, "analysis failed");

        let ok = AnalysisResult::success("tagging", JsonMap::new(), "   ");
        assert_eq!(ok.message, "analysis completed");
    }

    #[test]
    fn success_records_content_length() {
        let mut data = JsonMap::new();
        data.insert("tags".to_owned(), json!(["a", "b"]));
        let result = AnalysisResult::success("tagging", data, "extracted 2 tags");
        assert!(result.success);
        let length = result.metadata.get("contentLength").and_then(Value::as_u64);
        assert!(length.is_some_and(|len| len > 0));
    }

    #[test]
    fn cancelled_result_is_flagged() {
        let result = AnalysisResult::cancelled("summarization");
        assert!(!result.success);
        assert!(result.is_cancelled());
        assert!(result.data.is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let result = AnalysisResult::failure("sentiment", "nope").with_processing_time(1.5);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"processingTimeSeconds\""));
        assert!(json.contains("\"analyzerName\""));
    }
}
