use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Sampling options forwarded to the inference backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Sampling temperature; lower values score more deterministically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// A single text-generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier understood by the backend.
    pub model: String,
    /// The fully rendered prompt.
    pub prompt: String,
    /// Optional sampling parameters.
    #[serde(default)]
    pub options: GenerateOptions,
}

impl GenerateRequest {
    /// Creates a request with default sampling options.
    pub fn new<M: Into<String>, P: Into<String>>(model: M, prompt: P) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: GenerateOptions::default(),
        }
    }

    /// Sets the sampling options.
    #[must_use]
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}

/// Trait for text-generation backends.
///
/// A failed call is always a recoverable, per-call failure surfaced as
/// [`crate::Error::Provider`]; implementations must never treat backend
/// outages as fatal.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Returns the unique identifier for this provider.
    fn name(&self) -> &'static str;

    /// Checks whether the backend is currently reachable.
    async fn is_available(&self) -> bool;

    /// Generates text for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable, rejects the request,
    /// or produces an unparseable response.
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder() {
        let request = GenerateRequest::new("gemma3:4b", "hello").with_options(GenerateOptions {
            temperature: Some(0.3),
            top_p: Some(0.8),
        });
        assert_eq!(request.model, "gemma3:4b");
        assert_eq!(request.options.temperature, Some(0.3));
    }

    #[test]
    fn default_options_skip_serialization() {
        let request = GenerateRequest::new("gemma3:4b", "hello");
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("top_p"));
    }
}
