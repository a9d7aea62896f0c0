//! Ollama-backed inference provider for notelens.
//!
//! Implements the [`notelens_core::InferenceProvider`] trait over the Ollama
//! HTTP API: generation via `POST /api/generate`, availability and model
//! discovery via `GET /api/tags`.

/// Ollama service management (availability, model listing).
pub mod manager;
/// Wire types for the Ollama JSON API.
pub mod models;
/// The `InferenceProvider` implementation.
pub mod provider;

pub use manager::OllamaManager;
pub use models::{OllamaGenerateRequest, OllamaGenerateResponse, OllamaModelEntry};
pub use provider::OllamaProvider;
