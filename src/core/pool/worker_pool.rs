//! The Worker Pool: a process-wide, explicitly-owned singleton that
//! dispatches Parse Works in parallel (`spec.md` §4.7, §5).
//!
//! Grounded in the teacher's explicitly-constructed-singleton pattern
//! (never a hidden `OnceCell` reached via a bare static function, per
//! `spec.md` §9): the application root constructs one `WorkerPool` and
//! hands an `Arc` reference into whichever Strategy drives the batch.
//! Concurrency is bounded by a `tokio::sync::Semaphore` sized to the
//! configured pool size; an in-flight ledger keyed by a monotonic work id
//! (a `dashmap::DashMap`, grounded in the teacher's
//! `detectors/structure/directory/mod.rs` cache) tracks which files are
//! currently being tokenized, purely for observability.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Semaphore;

use crate::core::errors::{IngestError, Result};
use crate::core::model::ParseBatchResult;
use crate::core::parsing::{parse_file_into_stats, run_tokenizer};
use crate::core::pool::work::{ParseFileResult, ParseWork};

/// A process-wide pool of persistent tokenizer-invocation slots.
///
/// Construct exactly one per application run (per `spec.md` §9's
/// re-architecture note) and share it by `Arc` reference; never reach it
/// through a hidden static accessor.
pub struct WorkerPool {
    tokenizer_path: PathBuf,
    per_work_timeout: Duration,
    semaphore: Arc<Semaphore>,
    next_work_id: AtomicU64,
    in_flight: DashMap<u64, PathBuf>,
}

impl WorkerPool {
    /// Construct a new pool. `pool_size` is clamped to at least 1.
    pub fn new(tokenizer_path: PathBuf, pool_size: usize, per_work_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            tokenizer_path,
            per_work_timeout,
            semaphore: Arc::new(Semaphore::new(pool_size.max(1))),
            next_work_id: AtomicU64::new(0),
            in_flight: DashMap::new(),
        })
    }

    /// Submit a batch of Parse Works, returning one future per submission
    /// in submission order (`spec.md` §4.7, §5: positional correlation is
    /// guaranteed; a failed Work reports its error through its own future
    /// without cancelling or dropping any sibling).
    pub fn submit_batch(self: &Arc<Self>, works: Vec<ParseWork>, var_names: Vec<String>) -> ParseBatchResult {
        let futures = works
            .into_iter()
            .map(|work| {
                let pool = Arc::clone(self);
                let work_id = pool.next_work_id.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    pool.in_flight.insert(work_id, work.file_path.clone());
                    let result = pool.execute_one(work).await;
                    pool.in_flight.remove(&work_id);
                    result
                })
            })
            .collect();

        ParseBatchResult { futures, var_names }
    }

    async fn execute_one(&self, work: ParseWork) -> Result<ParseFileResult> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("worker pool semaphore is never closed");

        if !work.file_path.exists() {
            return Err(IngestError::transient(
                "worker_pool",
                format!("missing file at execution time: {}", work.file_path.display()),
            ));
        }

        let names: Vec<String> = work.stats.keys().cloned().collect();
        let records = run_tokenizer(&self.tokenizer_path, &work.file_path, &names, self.per_work_timeout).await?;
        parse_file_into_stats(&records, &work.stats)?;

        // Balance and reduce every distinct Stat exactly once (aliased
        // names share one instance via `parsed_ids`). A content-invariant
        // violation here fails this Work's future directly, per
        // `spec.md` §4.1/§7 — it must not surface later as a write-time
        // error that aborts every sibling file's row.
        let mut finalized = HashSet::new();
        for stat in work.stats.values() {
            if !finalized.insert(Arc::as_ptr(stat) as usize) {
                continue;
            }
            let mut guard = stat.lock().expect("stat mutex poisoned");
            guard.balance_content()?;
            guard.reduce_duplicates()?;
        }

        Ok(ParseFileResult::new(work.file_path, work.stats))
    }

    /// Number of Works currently executing, for progress reporting.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}
