//! ConfigAwareStrategy: enriches each parsed file's result with its
//! sibling `config.ini` sidecar (`spec.md` §4.8, §6).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use ini::Ini;
use tracing::warn;

use crate::core::errors::Result;
use crate::core::model::StatRequest;
use crate::core::pool::{ConfigSidecar, ParseFileResult, ParseWork};
use crate::core::strategy::simple::{build_stat_map, discover_files};
use crate::core::strategy::Strategy;

/// Parse a `config.ini`-style sidecar into a section→key→value mapping.
/// A missing or unparseable file logs a warning and yields an empty
/// mapping rather than an error, per `spec.md` §6's soft-warning policy.
fn parse_ini_sidecar(path: &Path) -> ConfigSidecar {
    match Ini::load_from_file(path) {
        Ok(ini) => {
            let mut map = IndexMap::new();
            for (section, properties) in ini.iter() {
                let section_name = section.unwrap_or_default().to_string();
                let mut kv = IndexMap::new();
                for (key, value) in properties.iter() {
                    kv.insert(key.to_string(), value.to_string());
                }
                map.insert(section_name, kv);
            }
            map
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config.ini sidecar, using empty configuration");
            IndexMap::new()
        }
    }
}

/// Strategy variant that attaches each result's sibling `config.ini`
/// sidecar under a `config` key.
#[derive(Debug)]
pub struct ConfigAwareStrategy {
    sidecar_name: String,
}

impl ConfigAwareStrategy {
    /// Construct a new `ConfigAwareStrategy` looking for `sidecar_name`
    /// (typically `config.ini`) alongside each parsed file.
    pub fn new(sidecar_name: impl Into<String>) -> Self {
        Self {
            sidecar_name: sidecar_name.into(),
        }
    }
}

impl Default for ConfigAwareStrategy {
    fn default() -> Self {
        Self::new("config.ini")
    }
}

#[async_trait]
impl Strategy for ConfigAwareStrategy {
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
        let sidecar_name = &self.sidecar_name;
        let enriched = results
            .into_iter()
            .map(|result| {
                result.map(|mut file_result| {
                    let sidecar_path: Option<PathBuf> =
                        file_result.file_path.parent().map(|dir| dir.join(sidecar_name));
                    let config = match sidecar_path {
                        Some(ref path) if path.exists() => parse_ini_sidecar(path),
                        Some(ref path) => {
                            warn!(path = %path.display(), "config.ini sidecar not found, using empty configuration");
                            IndexMap::new()
                        }
                        None => IndexMap::new(),
                    };
                    file_result.config = Some(config);
                    file_result
                })
            })
            .collect();
        Ok(enriched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ini_sidecar_reads_sections() {
        let dir = tempfile::tempdir().unwrap();
        let ini_path = dir.path().join("config.ini");
        std::fs::write(&ini_path, "[system]\ncpu_type=TimingSimpleCPU\n").unwrap();
        let parsed = parse_ini_sidecar(&ini_path);
        assert_eq!(parsed["system"]["cpu_type"], "TimingSimpleCPU");
    }

    #[test]
    fn test_parse_ini_sidecar_missing_file_returns_empty() {
        let parsed = parse_ini_sidecar(Path::new("/nonexistent/config.ini"));
        assert!(parsed.is_empty());
    }
}
