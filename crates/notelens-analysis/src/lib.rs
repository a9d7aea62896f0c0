//! Content analyzers and the analyzer registry.
//!
//! Each analyzer wraps a prompt strategy over an [`notelens_core::InferenceProvider`]
//! and returns a structured [`notelens_core::AnalysisResult`]. The
//! [`AnalyzerRegistry`] owns the analyzers, dispatches by name, and converts
//! analyzer errors into failure results so callers never have to handle a
//! panic or a bare `Err` from a lookup.

/// The `Analyzer` trait, descriptors, parameters, and validation helpers.
pub mod analyzer;
/// Multi-axis scoring analyzer.
pub mod compass;
/// Name-keyed analyzer registry and dispatch.
pub mod registry;
/// Sentiment analyzer.
pub mod sentiment;
/// Summary generation analyzer.
pub mod summarization;
/// Tag extraction analyzer with retry escalation.
pub mod tagging;
/// Scripted inference provider for tests.
pub mod testing;

pub use analyzer::{
    AnalysisParams, Analyzer, AnalyzerDescriptor, SentimentMode, SummaryType, meets_length,
};
pub use compass::CompassAnalyzer;
pub use registry::{AnalyzerRegistry, RegistrySummary};
pub use sentiment::SentimentAnalyzer;
pub use summarization::SummarizationAnalyzer;
pub use tagging::TaggingAnalyzer;
