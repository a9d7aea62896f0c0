use core::result::Result as CoreResult;
use std::io::Error as IoError;

use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use toml::de::Error as TomlError;

/// Result type for core operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur in the orchestration core.
///
/// Analyzer lookup misses and content-validation rejections are deliberately
/// *not* represented here: those are ordinary outcomes, returned as failed
/// [`crate::AnalysisResult`] values. This enum covers the genuinely
/// exceptional paths: I/O, serialization, the inference backend, the
/// metadata store, and cooperative cancellation.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The inference backend failed or returned an unusable response.
    #[error("Inference provider error: {0}")]
    Provider(String),

    /// Cooperative cancellation was observed.
    #[error("operation cancelled")]
    Cancelled,

    /// The metadata or note store rejected an operation.
    #[error("Store error: {0}")]
    Store(String),

    /// A foreground operation is already in flight.
    #[error("an analysis operation is already running")]
    AlreadyRunning,

    /// A general error not covered by other variants.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable name for this error's kind, recorded in
    /// `AnalysisResult.metadata.errorType`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "Io",
            Self::Json(_) => "Json",
            Self::Toml(_) => "Toml",
            Self::Config(_) => "Config",
            Self::Provider(_) => "Provider",
            Self::Cancelled => "Cancelled",
            Self::Store(_) => "Store",
            Self::AlreadyRunning => "AlreadyRunning",
            Self::Other(_) => "Other",
        }
    }

    /// Determines whether this error may succeed if retried.
    ///
    /// Only inference-backend failures are considered transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value as JsonValue, from_str};
    use std::io;

    #[test]
    fn error_display() {
        let error1 = Error::Config("missing model".to_owned());
        assert_eq!(error1.to_string(), "Configuration error: missing model");

        let error2 = Error::Provider("connection refused".to_owned());
        assert_eq!(
            error2.to_string(),
            "Inference provider error: connection refused"
        );

        let error3 = Error::Cancelled;
        assert_eq!(error3.to_string(), "operation cancelled");
    }

    #[test]
    fn error_kind_names() {
        assert_eq!(Error::Provider(String::new()).kind(), "Provider");
        assert_eq!(Error::Cancelled.kind(), "Cancelled");
        assert_eq!(Error::AlreadyRunning.kind(), "AlreadyRunning");
        assert_eq!(Error::Store(String::new()).kind(), "Store");
    }

    #[test]
    fn error_is_retryable() {
        assert!(Error::Provider("timeout".to_owned()).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(!Error::Config("bad config".to_owned()).is_retryable());
        assert!(!Error::Store("locked".to_owned()).is_retryable());
    }

    #[test]
    fn error_from_io() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn error_from_json() {
        let json_error = from_str::<JsonValue>("not json").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }
}
