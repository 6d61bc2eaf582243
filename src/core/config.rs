//! Engine configuration for ring5-ingest.
//!
//! Mirrors the teacher's `ValknutConfig` pattern: a single struct with a
//! `Default` impl documenting the shipped defaults, loadable from an
//! optional YAML file via the `config` crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

/// Environment variable overriding the worker pool size.
pub const WORKER_POOL_SIZE_ENV: &str = "RING5_WORKER_POOL_SIZE";

/// Default number of concurrent tokenizer/scanner subprocess invocations.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 4;

/// Default glob pattern used to discover statistics files within a run
/// directory.
pub const DEFAULT_GLOB: &str = "stats.txt";

/// Default per-work subprocess timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Number of concurrent tokenizer invocations permitted by the worker
    /// pool. Overridden at process start by `RING5_WORKER_POOL_SIZE` when
    /// set and parseable; otherwise this field (or its default).
    pub worker_pool_size: usize,

    /// Path to the tokenizer executable used to convert a raw statistics
    /// file into newline-delimited records.
    pub tokenizer_path: PathBuf,

    /// Path to the scanner executable used to discover the variable
    /// catalog of a statistics file.
    pub scanner_path: PathBuf,

    /// Glob pattern (relative to a scanned root) identifying statistics
    /// files to ingest.
    pub default_glob: String,

    /// Per-work subprocess timeout.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// Optional sidecar config filename consulted by `ConfigAwareStrategy`.
    pub config_sidecar_name: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            tokenizer_path: PathBuf::from("gem5-tokenizer"),
            scanner_path: PathBuf::from("gem5-scanner"),
            default_glob: DEFAULT_GLOB.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            config_sidecar_name: "config.ini".to_string(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from a YAML file, falling back to defaults for
    /// any field the file omits.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        let cfg: Self = settings.try_deserialize()?;
        Ok(cfg)
    }

    /// Persist configuration to a YAML file.
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Resolve the effective worker pool size, honoring
    /// `RING5_WORKER_POOL_SIZE` when it is set to a valid positive integer.
    pub fn resolved_worker_pool_size(&self) -> usize {
        std::env::var(WORKER_POOL_SIZE_ENV)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(self.worker_pool_size)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
