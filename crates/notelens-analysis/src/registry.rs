use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use notelens_core::{AnalysisResult, ProgressSink};

use crate::analyzer::{AnalysisParams, Analyzer, AnalyzerDescriptor};

/// Name-keyed collection of analyzers with failure-isolating dispatch.
///
/// Lookup misses, validation failures, and analyzer errors all come back as
/// failure [`AnalysisResult`]s rather than `Err`, so a caller iterating over
/// analyzers never aborts because one of them misbehaved.
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: BTreeMap<String, Arc<dyn Analyzer>>,
}

/// Aggregate view over a map of results, one entry per analyzer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySummary {
    /// Number of results inspected.
    pub total: usize,
    /// Number of successful results.
    pub succeeded: usize,
    /// Number of failed results.
    pub failed: usize,
    /// `succeeded / total`, or 0 when empty.
    pub success_rate: f64,
    /// Per-analyzer success flags in name order.
    pub by_analyzer: BTreeMap<String, bool>,
}

impl AnalyzerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an analyzer under its own name.
    ///
    /// Returns `false` without replacing when the name is already taken.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) -> bool {
        let name = analyzer.name().to_owned();
        if self.analyzers.contains_key(&name) {
            warn!(analyzer = %name, "duplicate analyzer registration rejected");
            return false;
        }
        info!(analyzer = %name, "analyzer registered");
        self.analyzers.insert(name, analyzer);
        true
    }

    /// Removes an analyzer by name. Returns `false` when absent.
    pub fn unregister(&mut self, name: &str) -> bool {
        let removed = self.analyzers.remove(name).is_some();
        if removed {
            info!(analyzer = %name, "analyzer unregistered");
        }
        removed
    }

    /// Registered analyzer names in sorted order.
    #[must_use]
    pub fn list_names(&self) -> Vec<String> {
        self.analyzers.keys().cloned().collect()
    }

    /// Descriptor for a registered analyzer.
    #[must_use]
    pub fn describe(&self, name: &str) -> Option<AnalyzerDescriptor> {
        self.analyzers.get(name).map(|analyzer| analyzer.descriptor())
    }

    /// Runs one analyzer by name, without progress or cancellation.
    pub async fn analyze(
        &self,
        name: &str,
        content: &str,
        params: &AnalysisParams,
    ) -> AnalysisResult {
        self.analyze_cancelable(
            name,
            content,
            params,
            &ProgressSink::disabled(),
            &CancellationToken::new(),
        )
        .await
    }

    /// Runs one analyzer by name with progress and cooperative cancellation.
    ///
    /// The wall-clock duration of the whole dispatch is stamped on the result
    /// regardless of outcome.
    pub async fn analyze_cancelable(
        &self,
        name: &str,
        content: &str,
        params: &AnalysisParams,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        let started = Instant::now();

        let Some(analyzer) = self.analyzers.get(name) else {
            return AnalysisResult::failure(name, format!("plugin not found: {name}"))
                .with_processing_time(started.elapsed().as_secs_f64());
        };

        if !analyzer.validate(content) {
            return AnalysisResult::failure(name, "content validation failed")
                .with_processing_time(started.elapsed().as_secs_f64());
        }

        let result = match analyzer
            .analyze_cancelable(content, params, progress, cancel)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                error!(analyzer = %name, error = %err, "analyzer failed");
                AnalysisResult::failure(name, format!("analysis failed: {err}"))
                    .with_metadata("errorType", err.kind())
            }
        };

        result.with_processing_time(started.elapsed().as_secs_f64())
    }

    /// Runs several analyzers sequentially over the same content.
    ///
    /// One analyzer's failure never affects the others; every requested name
    /// has an entry in the returned map.
    pub async fn analyze_many(
        &self,
        names: &[&str],
        content: &str,
        params: &AnalysisParams,
    ) -> BTreeMap<String, AnalysisResult> {
        let mut results = BTreeMap::new();
        for name in names {
            let result = self.analyze(name, content, params).await;
            results.insert((*name).to_owned(), result);
        }
        results
    }

    /// Aggregates a result map into totals and per-analyzer flags.
    #[must_use]
    pub fn summarize_results(results: &BTreeMap<String, AnalysisResult>) -> RegistrySummary {
        let total = results.len();
        let succeeded = results.values().filter(|result| result.success).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            succeeded as f64 / total as f64
        };

        RegistrySummary {
            total,
            succeeded,
            failed: total - succeeded,
            success_rate,
            by_analyzer: results
                .iter()
                .map(|(name, result)| (name.clone(), result.success))
                .collect(),
        }
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AnalyzerRegistry")
            .field("analyzers", &self.list_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalyzerDescriptor;
    use serde_json::Value;
    use async_trait::async_trait;
    use notelens_core::{JsonMap, Result};

    struct FixedAnalyzer {
        name: &'static str,
        outcome: fn(&'static str) -> Result<AnalysisResult>,
    }

    #[async_trait]
    impl Analyzer for FixedAnalyzer {
        fn name(&self) -> &'static str {
            self.name
        }

        fn descriptor(&self) -> AnalyzerDescriptor {
            AnalyzerDescriptor {
                name: self.name.to_owned(),
                description: "fixed outcome".to_owned(),
                version: "1.0.0".to_owned(),
                requires_external_service: false,
                max_retries: 0,
                timeout_seconds: 30,
            }
        }

        fn validate(&self, content: &str) -> bool {
            !content.is_empty()
        }

        async fn analyze_cancelable(
            &self,
            _content: &str,
            _params: &AnalysisParams,
            _progress: &ProgressSink,
            _cancel: &CancellationToken,
        ) -> Result<AnalysisResult> {
            (self.outcome)(self.name)
        }
    }

    fn ok_analyzer(name: &'static str) -> Arc<dyn Analyzer> {
        Arc::new(FixedAnalyzer {
            name,
            outcome: |name| Ok(AnalysisResult::success(name, JsonMap::new(), "done")),
        })
    }

    fn err_analyzer(name: &'static str) -> Arc<dyn Analyzer> {
        Arc::new(FixedAnalyzer {
            name,
            outcome: |_| Err(notelens_core::Error::Provider("backend down".to_owned())),
        })
    }

    #[tokio::test]
    async fn unknown_name_yields_failure_result() {
        let registry = AnalyzerRegistry::new();
        let result = registry
            .analyze("nonexistent", "some content", &AnalysisParams::default())
            .await;
        assert!(!result.success);
        assert!(result.data.is_empty());
        assert_eq!(result.analyzer_name, "nonexistent");
        assert!(result.message.contains("plugin not found"));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = AnalyzerRegistry::new();
        assert!(registry.register(ok_analyzer("alpha")));
        assert!(!registry.register(ok_analyzer("alpha")));
        assert_eq!(registry.list_names(), vec!["alpha"]);
    }

    #[tokio::test]
    async fn validation_failure_is_a_failure_result() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(ok_analyzer("alpha"));
        let result = registry.analyze("alpha", "", &AnalysisParams::default()).await;
        assert!(!result.success);
        assert_eq!(result.message, "content validation failed");
    }

    #[tokio::test]
    async fn analyzer_error_converted_with_kind() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(err_analyzer("broken"));
        let result = registry
            .analyze("broken", "content", &AnalysisParams::default())
            .await;
        assert!(!result.success);
        assert!(result.data.is_empty());
        assert_eq!(
            result.metadata.get("errorType").and_then(Value::as_str),
            Some("Provider")
        );
    }

    #[tokio::test]
    async fn analyze_many_isolates_failures() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(err_analyzer("broken"));
        registry.register(ok_analyzer("fine"));

        let results = registry
            .analyze_many(&["broken", "fine"], "content", &AnalysisParams::default())
            .await;
        assert_eq!(results.len(), 2);
        assert!(!results["broken"].success);
        assert!(results["fine"].success);

        let summary = AnalyzerRegistry::summarize_results(&results);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!((summary.success_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unregister_unknown_is_false() {
        let mut registry = AnalyzerRegistry::new();
        assert!(!registry.unregister("missing"));
        registry.register(ok_analyzer("alpha"));
        assert!(registry.unregister("alpha"));
        assert!(registry.list_names().is_empty());
    }
}
