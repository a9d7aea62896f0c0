//! Core types and traits for the notelens analysis orchestration system.
//!
//! This crate provides the value objects, error taxonomy, inference-provider
//! trait, and progress/configuration primitives shared by the analyzer,
//! provider, and engine crates.

/// Configuration types and TOML loading.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Progress reporting sinks.
pub mod progress;
/// Batch reports and metadata-store records.
pub mod report;
/// Analysis result value type.
pub mod result;
/// Lock helpers for poisoned mutexes.
pub mod sync;
/// Trait definitions for inference providers.
pub mod traits;

pub use config::{AnalysisConfig, NotelensConfig, OllamaConfig, RunnerConfig, StorageConfig};
pub use error::{Error, Result};
pub use progress::{BatchProgressSink, ProgressSink};
pub use report::{BatchItemOutcome, BatchReport, NoteRecord, NoteStatus, StoredAnalysis};
pub use result::{AnalysisResult, JsonMap};
pub use traits::{GenerateOptions, GenerateRequest, InferenceProvider};
