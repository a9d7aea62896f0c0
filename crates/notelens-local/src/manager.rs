use reqwest::Client;

use notelens_core::{Error, Result};

use crate::models::{OllamaListResponse, OllamaModelEntry};

/// Manages the connection to a local Ollama service.
pub struct OllamaManager {
    /// HTTP client used to talk to the service.
    client: Client,
    /// Base URL of the Ollama runtime.
    base_url: String,
}

impl OllamaManager {
    /// Creates a manager pointing at the default local endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_owned(),
        }
    }

    /// Overrides the service URL.
    #[must_use]
    pub fn with_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Checks whether the service answers at all.
    pub async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .is_ok()
    }

    /// Lists the installed models.
    ///
    /// # Errors
    /// Returns an error if the service is unreachable or the response cannot
    /// be parsed.
    pub async fn list_models(&self) -> Result<Vec<OllamaModelEntry>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|err| Error::Provider(format!("Ollama unavailable: {err}")))?;

        let list: OllamaListResponse = response
            .json()
            .await
            .map_err(|err| Error::Provider(format!("failed to parse model list: {err}")))?;
        Ok(list.models)
    }

    /// Resolves a usable model name, preferring `preferred` when installed.
    ///
    /// Falls back to the first installed model, and to `preferred` itself
    /// when the list cannot be retrieved (the subsequent generate call will
    /// then surface the real error).
    pub async fn resolve_model(&self, preferred: &str) -> String {
        match self.list_models().await {
            Ok(models) => pick_model(preferred, &models),
            Err(_) => preferred.to_owned(),
        }
    }
}

fn pick_model(preferred: &str, models: &[OllamaModelEntry]) -> String {
    if models.iter().any(|model| model.name == preferred) {
        preferred.to_owned()
    } else {
        models
            .first()
            .map_or_else(|| preferred.to_owned(), |model| model.name.clone())
    }
}

impl Default for OllamaManager {
    fn default() -> Self {
        Self::new()
    }
}
