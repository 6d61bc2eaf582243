//! `ParserApi`: the public facade exposing the four operations external
//! callers drive an ingestion run through (`spec.md` §6): scanning,
//! pattern aggregation, parsing, and CSV finalization.
//!
//! Grounded in the teacher's top-level `Analyzer`/pipeline facade that
//! ties its detector registry, worker pool, and output writer behind one
//! entry point — `Engine` plays the same role here, holding the
//! explicitly-constructed `WorkerPool` singleton and a chosen `Strategy`
//! rather than reaching either through hidden statics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::config::IngestConfig;
use crate::core::errors::Result;
use crate::core::model::{ParseBatchResult, ScannedVariable, StatRequest};
use crate::core::parsing::{aggregate_scan_results, scan_files_parallel};
use crate::core::pool::{ParseFileResult, WorkerPool};
use crate::core::strategy::{SimpleStrategy, Strategy};
use crate::core::strategy::simple::discover_files;
use crate::io::finalize_parsing;

/// The four public operations an ingestion run is driven through.
///
/// `submit_parse_async` mirrors `WorkerPool::submit_batch`'s contract: it
/// returns the batch's futures rather than awaiting them, so a caller can
/// overlap submission across multiple roots before collecting results.
#[async_trait]
pub trait ParserApi: Send + Sync {
    /// Discover files under `root` matching `glob` and scan each in
    /// parallel, bounded by the engine's configured worker pool size.
    async fn submit_scan_async(&self, root: &Path, glob: &str) -> Result<Vec<Result<Vec<ScannedVariable>>>>;

    /// Collapse indexed variable families discovered across a batch of
    /// per-file scans into aggregate Scanned Variables (`spec.md` §4.5).
    fn aggregate_scan_results(&self, per_file: Vec<Vec<ScannedVariable>>) -> Vec<ScannedVariable>;

    /// Build one Parse Work per file discovered under `root` matching
    /// `glob` and submit the batch to the worker pool, returning its
    /// positionally-correlated futures without awaiting them.
    async fn submit_parse_async(&self, root: &Path, glob: &str, requests: &[StatRequest]) -> Result<ParseBatchResult>;

    /// Balance, reduce, and write every completed result to
    /// `output_dir/results.csv`. `var_names` falls back to the key order
    /// of the first result when absent (`spec.md` §4.9, §6).
    fn finalize_parsing(
        &self,
        output_dir: &Path,
        results: &[ParseFileResult],
        var_names: Option<&[String]>,
    ) -> Result<PathBuf>;

    /// Run the engine's configured strategy's post-processing step over an
    /// already-collected batch of results (e.g. attaching `config.ini`
    /// sidecars for `ConfigAwareStrategy`; identity for `SimpleStrategy`).
    /// Callers should run this after awaiting `submit_parse_async`'s
    /// futures and before `finalize_parsing`.
    async fn post_process(&self, results: Vec<ParseFileResult>) -> Result<Vec<ParseFileResult>>;
}

/// The default `ParserApi` implementation: one explicitly-constructed
/// `WorkerPool`, one `Strategy`, driven by one `IngestConfig`.
pub struct Engine {
    config: IngestConfig,
    pool: Arc<WorkerPool>,
    strategy: Box<dyn Strategy>,
}

impl Engine {
    /// Construct a new engine from `config`, spinning up its own
    /// `WorkerPool` sized per `config.resolved_worker_pool_size()`.
    ///
    /// Fails immediately if the configured scanner executable cannot be
    /// located, per the Scanner's dependency-check-on-construction
    /// contract (`spec.md` §4.4) — a missing tokenizer/scanner dependency
    /// is a construction error, not something discovered lazily on first
    /// use.
    pub fn new(config: IngestConfig) -> Result<Self> {
        Self::with_strategy(config, Box::new(SimpleStrategy::new()))
    }

    /// Construct a new engine using an explicitly supplied `Strategy`
    /// (e.g. `ConfigAwareStrategy` for sidecar-enriched runs).
    pub fn with_strategy(config: IngestConfig, strategy: Box<dyn Strategy>) -> Result<Self> {
        crate::core::parsing::scanner::ensure_scanner_available(&config.scanner_path)?;
        let pool = WorkerPool::new(
            config.tokenizer_path.clone(),
            config.resolved_worker_pool_size(),
            config.timeout,
        );
        Ok(Self {
            config,
            pool,
            strategy,
        })
    }

    /// The worker pool backing this engine, for callers that need direct
    /// access (e.g. progress reporting via `in_flight_count`).
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }
}

#[async_trait]
impl ParserApi for Engine {
    async fn submit_scan_async(&self, root: &Path, glob: &str) -> Result<Vec<Result<Vec<ScannedVariable>>>> {
        let files = discover_files(root, glob)?;
        let limit = self.config.resolved_worker_pool_size() as i64;
        Ok(scan_files_parallel(&self.config.scanner_path, files, limit, self.config.timeout).await)
    }

    fn aggregate_scan_results(&self, per_file: Vec<Vec<ScannedVariable>>) -> Vec<ScannedVariable> {
        aggregate_scan_results(per_file)
    }

    async fn submit_parse_async(&self, root: &Path, glob: &str, requests: &[StatRequest]) -> Result<ParseBatchResult> {
        let (works, var_names) = self.strategy.get_work_items(root, glob, requests)?;
        Ok(self.pool.submit_batch(works, var_names))
    }

    fn finalize_parsing(
        &self,
        output_dir: &Path,
        results: &[ParseFileResult],
        var_names: Option<&[String]>,
    ) -> Result<PathBuf> {
        finalize_parsing(output_dir, results, var_names)
    }

    async fn post_process(&self, results: Vec<ParseFileResult>) -> Result<Vec<ParseFileResult>> {
        let wrapped = results.into_iter().map(Ok).collect();
        let processed = self.strategy.post_process(wrapped).await?;
        processed.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stats::StatKindTag;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_submit_scan_async_on_empty_root_returns_empty() {
        let dir = tempdir().unwrap();
        let engine = Engine::new(IngestConfig::default()).unwrap();
        let results = engine.submit_scan_async(dir.path(), "stats.txt").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_submit_parse_async_on_empty_root_returns_no_futures() {
        let dir = tempdir().unwrap();
        let engine = Engine::new(IngestConfig::default()).unwrap();
        let requests = vec![StatRequest::concrete("simTicks", StatKindTag::Scalar, 1)];
        let batch = engine.submit_parse_async(dir.path(), "stats.txt", &requests).await.unwrap();
        assert!(batch.futures.is_empty());
        assert_eq!(batch.var_names, vec!["simTicks".to_string()]);
    }

    #[tokio::test]
    async fn test_post_process_attaches_config_ini_sidecar_for_config_aware_engine() {
        use crate::core::pool::ParseFileResult;
        use crate::core::strategy::simple::build_stat_map;
        use crate::core::strategy::ConfigAwareStrategy;

        let dir = tempdir().unwrap();
        let stats_path = dir.path().join("stats.txt");
        std::fs::write(&stats_path, "scalar/simTicks/100\n").unwrap();
        std::fs::write(dir.path().join("config.ini"), "[system]\ncpu_type=TimingSimpleCPU\n").unwrap();

        let engine = Engine::with_strategy(IngestConfig::default(), Box::new(ConfigAwareStrategy::default())).unwrap();
        let requests = vec![StatRequest::concrete("simTicks", StatKindTag::Scalar, 1)];
        let stats = build_stat_map(&requests).unwrap();
        let results = vec![ParseFileResult::new(stats_path, stats)];

        let processed = engine.post_process(results).await.unwrap();
        assert_eq!(processed.len(), 1);
        let config = processed[0].config.as_ref().expect("sidecar should be attached");
        assert_eq!(config["system"]["cpu_type"], "TimingSimpleCPU");
    }
}
