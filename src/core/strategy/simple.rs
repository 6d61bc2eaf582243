//! SimpleStrategy: plain glob-based file discovery and parsing, no
//! sidecar enrichment (`spec.md` §4.8).
//!
//! File discovery is grounded in the teacher's
//! `core/pipeline/file_discovery.rs` `ignore::WalkBuilder` +
//! `globset::Glob` combination, simplified to a single explicit glob
//! since simulation output trees are not source repositories and the
//! teacher's git-tracked-files shortcut does not apply here.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use globset::Glob;
use ignore::WalkBuilder;
use indexmap::IndexMap;

use crate::core::errors::{IngestError, Result};
use crate::core::model::StatRequest;
use crate::core::pool::{ParseFileResult, ParseWork, SharedStat, StatMap};
use crate::core::stats::construct_stat;
use crate::core::strategy::Strategy;

/// Resolve and validate a root directory.
fn validate_root(root: &Path) -> Result<PathBuf> {
    let canonical = root
        .canonicalize()
        .map_err(|e| IngestError::input_validation(format!("cannot resolve root {}: {e}", root.display())))?;
    if !canonical.is_dir() {
        return Err(IngestError::input_validation(format!(
            "root {} is not a directory",
            canonical.display()
        )));
    }
    Ok(canonical)
}

/// Reject glob patterns containing path-escape sequences and compile the
/// rest.
fn validate_glob(glob: &str) -> Result<Glob> {
    if glob.contains("..") {
        return Err(IngestError::input_validation(
            "glob pattern must not contain path-escape sequences",
        ));
    }
    Glob::new(glob).map_err(|e| IngestError::input_validation(format!("invalid glob pattern '{glob}': {e}")))
}

/// Walk `root` recursively, collecting files whose basename matches
/// `glob`, in a stable (sorted) order so CSV row order is deterministic
/// across runs.
pub fn discover_files(root: &Path, glob: &str) -> Result<Vec<PathBuf>> {
    let root = validate_root(root)?;
    let matcher = validate_glob(glob)?.compile_matcher();

    let mut files: Vec<PathBuf> = WalkBuilder::new(&root)
        .git_ignore(false)
        .git_exclude(false)
        .git_global(false)
        .ignore(false)
        .hidden(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter(|entry| matcher.is_match(entry.file_name()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    Ok(files)
}

/// Build a fresh Stat-by-name map for one file: one instance per
/// requested name, plus one alias entry per `parsed_ids` id pointing at
/// the same shared instance. Duplicate variable definitions within the
/// request list are a hard construction error (`spec.md` §4.2).
pub fn build_stat_map(requests: &[StatRequest]) -> Result<StatMap> {
    let mut map: StatMap = IndexMap::new();
    for request in requests {
        if request.name.starts_with('-') {
            return Err(IngestError::input_validation(format!(
                "variable name '{}' must not begin with '-'",
                request.name
            )));
        }
        if map.contains_key(&request.name) {
            return Err(IngestError::construction(format!(
                "duplicate variable definition '{}' in request list",
                request.name
            )));
        }
        let stat = construct_stat(request, &request.name)?;
        let shared: SharedStat = Arc::new(Mutex::new(stat));
        map.insert(request.name.clone(), Arc::clone(&shared));

        if let Some(ids) = &request.params.parsed_ids {
            for id in ids {
                if id == &request.name {
                    continue;
                }
                if map.contains_key(id) {
                    return Err(IngestError::construction(format!(
                        "duplicate variable definition '{id}' in request list"
                    )));
                }
                map.insert(id.clone(), Arc::clone(&shared));
            }
        }
    }
    Ok(map)
}

/// The plain Strategy: no sidecar enrichment, `post_process` is identity.
#[derive(Debug, Default)]
pub struct SimpleStrategy;

impl SimpleStrategy {
    /// Construct a new `SimpleStrategy`.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Strategy for SimpleStrategy {
    fn get_work_items(
        &self,
        root: &Path,
        glob: &str,
        requests: &[StatRequest],
    ) -> Result<(Vec<ParseWork>, Vec<String>)> {
        let var_names: Vec<String> = requests.iter().map(|r| r.name.clone()).collect();
        let files = discover_files(root, glob)?;
        if files.is_empty() {
            return Ok((Vec::new(), var_names));
        }
        let mut works = Vec::with_capacity(files.len());
        for file in files {
            let stats = build_stat_map(requests)?;
            works.push(ParseWork::new(file, stats));
        }
        Ok((works, var_names))
    }

    async fn post_process(
        &self,
        results: Vec<Result<ParseFileResult>>,
    ) -> Result<Vec<Result<ParseFileResult>>> {
        Ok(results)
    }
}
