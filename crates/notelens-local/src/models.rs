use serde::{Deserialize, Serialize};

/// Request body for `POST /api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaGenerateRequest {
    /// Model identifier.
    pub model: String,
    /// Rendered prompt text.
    pub prompt: String,
    /// Sampling options; omitted entirely when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
    /// Always `false`; the orchestration core consumes whole responses.
    pub stream: bool,
}

/// Sampling options understood by Ollama.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OllamaOptions {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// Response body for `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaGenerateResponse {
    /// Generated text.
    pub response: String,
    /// Tokens consumed by the prompt.
    #[serde(default)]
    pub prompt_eval_count: u64,
    /// Tokens generated.
    #[serde(default)]
    pub eval_count: u64,
}

/// Response body for `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub struct OllamaListResponse {
    /// Models installed in the Ollama service.
    pub models: Vec<OllamaModelEntry>,
}

/// One installed model as reported by `GET /api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModelEntry {
    /// Model identifier.
    pub name: String,
    /// Size of the model in bytes.
    #[serde(default)]
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_unset_options() {
        let request = OllamaGenerateRequest {
            model: "gemma3:4b".to_owned(),
            prompt: "hello".to_owned(),
            options: None,
            stream: false,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("options"));
        assert!(json.contains("\"stream\":false"));
    }

    #[test]
    fn response_defaults_token_counts() {
        let response: OllamaGenerateResponse =
            serde_json::from_str(r#"{"response": "ok"}"#).unwrap();
        assert_eq!(response.response, "ok");
        assert_eq!(response.eval_count, 0);
    }
}
