//! Parse Work: a per-file unit of parallel work (`spec.md` §4.7).

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use crate::core::stats::Stat;

/// A Stat instance shared across every name that aliases it (the
/// requesting name plus any `parsed_ids` aliases). Wrapped in a `Mutex`
/// so aliased names can mutate the same instance during a single Work's
/// single-threaded parse pass; never accessed from more than one Work.
pub type SharedStat = Arc<Mutex<Box<dyn Stat>>>;

/// The per-file `Stat-by-name` map a Parse Work owns exclusively.
pub type StatMap = IndexMap<String, SharedStat>;

/// A single unit of parallel work: one file, its requested Stat-by-name
/// map (including `parsed_ids` aliases pointing at shared instances).
#[derive(Debug)]
pub struct ParseWork {
    /// The statistics file to parse.
    pub file_path: PathBuf,
    /// Stat instances keyed by requested/aliased variable name.
    pub stats: StatMap,
}

impl ParseWork {
    /// Construct a new Parse Work.
    pub fn new(file_path: PathBuf, stats: StatMap) -> Self {
        Self { file_path, stats }
    }
}

/// Per-section, per-key string values parsed from a sidecar `config.ini`
/// file, attached by `ConfigAwareStrategy::post_process`.
pub type ConfigSidecar = IndexMap<String, IndexMap<String, String>>;

/// The result of executing one Parse Work: the same Stat-by-name map,
/// now populated, plus any sidecar configuration enrichment attached by
/// the Strategy's post-processing step.
#[derive(Debug)]
pub struct ParseFileResult {
    /// The file that was parsed.
    pub file_path: PathBuf,
    /// Populated Stat instances keyed by variable name.
    pub stats: StatMap,
    /// Sidecar configuration enrichment, if the strategy in use attaches
    /// one.
    pub config: Option<ConfigSidecar>,
}

impl ParseFileResult {
    /// Construct a result with no configuration enrichment.
    pub fn new(file_path: PathBuf, stats: StatMap) -> Self {
        Self {
            file_path,
            stats,
            config: None,
        }
    }
}
