//! Configuration for the orchestration core.
//!
//! Every section has serde defaults so a partial TOML file (or none at all)
//! yields a working configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Complete notelens configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotelensConfig {
    /// Inference backend settings.
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Analyzer thresholds.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Task runner settings.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Note and metadata storage locations.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl NotelensConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Ollama endpoint and model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama service.
    pub base_url: String,
    /// Default model for tagging, summarization, and sentiment.
    pub model: String,
    /// Model used for the multi-axis compass analyzer.
    pub compass_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_owned(),
            model: "gemma3:4b".to_owned(),
            compass_model: "gemma3:4b".to_owned(),
        }
    }
}

/// Thresholds shared by the analyzers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Longest response still accepted as a clean tag list.
    pub max_tags_length: usize,
    /// Retry budget for the tagging escalation loop.
    pub max_tag_retries: u32,
    /// Summary length past which one compression pass is issued.
    pub max_summary_length: usize,
    /// Target length requested from the compression pass.
    pub compressed_summary_length: usize,
    /// Minimum content length for summarization.
    pub min_summary_content: usize,
    /// Minimum content length when text is multi-byte dense.
    pub dense_min_chars: usize,
    /// Minimum content length for plain single-byte text.
    pub plain_min_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_tags_length: 100,
            max_tag_retries: 3,
            max_summary_length: 500,
            compressed_summary_length: 200,
            min_summary_content: 100,
            dense_min_chars: 20,
            plain_min_chars: 30,
        }
    }
}

/// Task runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Maximum operations running concurrently.
    pub max_concurrent: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

/// Filesystem layout for notes and the metadata index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding active notes.
    pub notes_dir: PathBuf,
    /// Directory holding archived notes.
    pub archive_dir: PathBuf,
    /// Path of the JSON metadata index.
    pub index_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            notes_dir: PathBuf::from("notes"),
            archive_dir: PathBuf::from("archive"),
            index_path: PathBuf::from("notes_index.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_are_sane() {
        let config = NotelensConfig::default();
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.analysis.max_tags_length, 100);
        assert_eq!(config.analysis.max_tag_retries, 3);
        assert_eq!(config.runner.max_concurrent, 4);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: NotelensConfig = toml::from_str(
            r#"
            [ollama]
            base_url = "http://inference:11434"
            model = "qwen3:8b"
            compass_model = "qwen3:8b"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.ollama.model, "qwen3:8b");
        assert_eq!(parsed.analysis.max_summary_length, 500);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runner]\nmax_concurrent = 2").unwrap();
        let config = NotelensConfig::load(file.path()).unwrap();
        assert_eq!(config.runner.max_concurrent, 2);
    }
}
