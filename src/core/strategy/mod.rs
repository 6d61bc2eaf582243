//! Strategy: drives a parse for one simulation (`spec.md` §4.8).

pub mod config_aware;
pub mod simple;

use std::path::Path;

use async_trait::async_trait;

use crate::core::errors::Result;
use crate::core::model::StatRequest;
use crate::core::pool::{ParseFileResult, ParseWork};

pub use config_aware::ConfigAwareStrategy;
pub use simple::SimpleStrategy;

/// Shared contract implemented by both the plain and config-aware
/// strategies.
///
/// `post_process` preserves a per-Work `Result` rather than failing the
/// whole batch on the first error: `spec.md` §7 leaves the "fail batch on
/// any Work failure" policy to the caller, so the Strategy itself only
/// surfaces per-Work outcomes.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Walk `root` recursively collecting files matching `glob`, build
    /// the Stat-by-name map once per file, and return one Parse Work per
    /// file alongside the ordered variable-name list.
    fn get_work_items(
        &self,
        root: &Path,
        glob: &str,
        requests: &[StatRequest],
    ) -> Result<(Vec<ParseWork>, Vec<String>)>;

    /// Post-process a batch's results. Identity for the simple strategy;
    /// attaches sidecar configuration for the config-aware variant.
    async fn post_process(
        &self,
        results: Vec<Result<ParseFileResult>>,
    ) -> Result<Vec<Result<ParseFileResult>>>;
}
