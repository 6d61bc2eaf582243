//! # ring5-ingest: Parallel Ingestion Engine for gem5-style Statistics Output
//!
//! A Rust implementation of a parallel ingestion engine for gem5-style
//! simulator statistics files, designed for deterministic output and safe
//! concurrent parsing of large sweeps of simulation output. This library
//! provides:
//!
//! - **Typed Stat Model**: Scalar, Vector, Distribution, Histogram, and
//!   Configuration statistic kinds, each with explicit accumulate/balance/
//!   reduce semantics instead of runtime attribute guards.
//! - **Scanning & Pattern Aggregation**: discovery of per-file variable
//!   catalogs and aggregation of numbered/indexed variable families into
//!   regex-backed patterns.
//! - **Parallel Worker Pool**: bounded-concurrency subprocess tokenization
//!   with a positional-future guarantee — no submission silently vanishes.
//! - **Strategies**: plain scanning/parsing and `config.ini`-aware
//!   post-processing of per-run configuration sidecars.
//! - **CSV Finalization**: deterministic column ordering and explicit
//!   `"NaN"` markers for missing observations.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ring5_ingest::core::config::IngestConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IngestConfig::default();
//!     println!("worker pool size: {}", config.worker_pool_size);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

/// Core ingestion engine: error taxonomy, configuration, stat model,
/// parsing pipeline, worker pool, and strategies.
pub mod core {
    //! Core ingestion algorithms and data structures.

    pub mod api;
    pub mod config;
    pub mod errors;
    pub mod model;
    pub mod parsing;
    pub mod pool;
    pub mod stats;
    pub mod strategy;
}

pub mod io;

pub use core::api::ParserApi;
pub use core::errors::{IngestError, Result};
pub use core::model::{ParseBatchResult, ScannedVariable, StatRequest};

/// Library version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
