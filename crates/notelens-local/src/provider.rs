use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use notelens_core::{Error, GenerateRequest, InferenceProvider, Result};

use crate::manager::OllamaManager;
use crate::models::{OllamaGenerateRequest, OllamaGenerateResponse, OllamaOptions};

/// [`InferenceProvider`] backed by a local Ollama service.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    /// Model used when a request leaves the model unset.
    default_model: String,
    manager: OllamaManager,
}

impl OllamaProvider {
    /// Creates a provider against the default local endpoint.
    #[must_use]
    pub fn new(default_model: String) -> Self {
        Self::with_url("http://localhost:11434".to_owned(), default_model)
    }

    /// Creates a provider against a specific endpoint.
    #[must_use]
    pub fn with_url(base_url: String, default_model: String) -> Self {
        let manager = OllamaManager::new().with_url(base_url.clone());
        Self {
            client: Client::new(),
            base_url,
            default_model,
            manager,
        }
    }

    /// The service manager, for model discovery.
    #[must_use]
    pub fn manager(&self) -> &OllamaManager {
        &self.manager
    }
}

#[async_trait]
impl InferenceProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        self.manager.is_available().await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        let opts = &request.options;
        let options = if opts.temperature.is_some() || opts.top_p.is_some() {
            Some(OllamaOptions {
                temperature: opts.temperature,
                top_p: opts.top_p,
            })
        } else {
            None
        };

        let body = OllamaGenerateRequest {
            model,
            prompt: request.prompt.clone(),
            options,
            stream: false,
        };

        debug!(model = %body.model, prompt_len = body.prompt.len(), "ollama generate");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::Provider(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "Ollama returned {status}: {detail}"
            )));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|err| Error::Provider(format!("invalid response body: {err}")))?;

        debug!(
            prompt_tokens = parsed.prompt_eval_count,
            output_tokens = parsed.eval_count,
            "ollama generate finished"
        );

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notelens_core::GenerateOptions;

    #[test]
    fn empty_model_falls_back_to_default() {
        let provider = OllamaProvider::new("gemma3:4b".to_owned());
        let request = GenerateRequest::new(String::new(), "hello".to_owned());
        let model = if request.model.is_empty() {
            provider.default_model.clone()
        } else {
            request.model.clone()
        };
        assert_eq!(model, "gemma3:4b");
    }

    #[test]
    fn options_map_onto_wire_type() {
        let opts = GenerateOptions {
            temperature: Some(0.3),
            top_p: Some(0.8),
        };
        let wire = OllamaOptions {
            temperature: opts.temperature,
            top_p: opts.top_p,
        };
        let json = serde_json::to_string(&wire).unwrap();
        assert!(json.contains("0.3"));
        assert!(json.contains("0.8"));
    }
}
