//! Parse Work & Worker Pool (`spec.md` §4.7, §5).

pub mod work;
pub mod worker_pool;

pub use work::{ConfigSidecar, ParseFileResult, ParseWork, SharedStat, StatMap};
pub use worker_pool::WorkerPool;
