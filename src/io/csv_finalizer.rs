//! CSV Finalizer: writes the deterministic tabular output from
//! already-balanced-and-reduced Stats (`spec.md` §4.9).
//!
//! Balancing and reduction happen once per Work, in
//! `WorkerPool::execute_one`, before a result ever reaches this module —
//! a content-invariant violation fails that Work's future and never
//! reaches the finalizer. This module only reads `reduced_content()`; a
//! row whose Stat is for some reason not yet finalized is skipped with a
//! warning rather than aborting the write for every sibling row
//! (`spec.md` §7: a failed Work contributes no row, but good Works still
//! produce theirs).
//!
//! Grounded on the reference `_persist_results()` behavior read from the
//! original implementation's `parsing/parser.py`: column order is fixed
//! by the caller's `var_names`, a column's entry-bearing status is
//! decided by inspecting the first result in which the variable appears,
//! and any variable entirely absent from a row becomes a literal `"NaN"`
//! rather than a fabricated zero.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{Terminator, WriterBuilder};
use tracing::warn;

use crate::core::errors::{IngestError, Result};
use crate::core::pool::ParseFileResult;
use crate::core::stats::ReducedContent;

/// Write `results` to `output_dir/results.csv`, returning the absolute
/// path written.
///
/// Column order follows `var_names` exactly when given; if `var_names`
/// is absent, it falls back to the key order of the first result
/// (`spec.md` §4.9, §6). Row order follows `results`' order (the
/// Strategy's file-discovery order). A variable missing from one row's
/// Stat-by-name map contributes `"NaN"` for its column(s) in that row
/// without touching any Stat. A row whose Stat content is not finalized
/// is logged and omitted from the output rather than failing the whole
/// write.
pub fn finalize_parsing(
    output_dir: &Path,
    results: &[ParseFileResult],
    var_names: Option<&[String]>,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join("results.csv");

    let fallback;
    let var_names: &[String] = match var_names {
        Some(names) => names,
        None => {
            fallback = results
                .first()
                .map(|r| r.stats.keys().cloned().collect())
                .unwrap_or_default();
            &fallback
        }
    };

    let columns = resolve_columns(results, var_names);
    let header = build_header(&columns);

    let file = fs::File::create(&output_path)?;
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file);
    writer.write_record(&header).map_err(IngestError::from)?;

    for result in results {
        match build_row(result, &columns) {
            Ok(row) => writer.write_record(&row).map_err(IngestError::from)?,
            Err(e) => {
                warn!(file = %result.file_path.display(), error = %e, "omitting row: stat content not finalized");
            }
        }
    }

    writer.flush()?;
    output_path.canonicalize().map_err(IngestError::from)
}

/// For each requested variable, the declared entries of the first result
/// in which it appears (`None` for non-entry-bearing kinds).
fn resolve_columns(
    results: &[ParseFileResult],
    var_names: &[String],
) -> Vec<(String, Option<Vec<String>>)> {
    var_names
        .iter()
        .map(|name| {
            let entries = results.iter().find_map(|result| result.stats.get(name)).and_then(|stat| {
                let guard = stat.lock().expect("stat mutex poisoned");
                guard.entries()
            });
            (name.clone(), entries)
        })
        .collect()
}

fn build_header(columns: &[(String, Option<Vec<String>>)]) -> Vec<String> {
    let mut header = Vec::new();
    for (name, entries) in columns {
        match entries {
            Some(list) => {
                for entry in list {
                    header.push(format!("{name}..{entry}"));
                }
            }
            None => header.push(name.clone()),
        }
    }
    header
}

fn build_row(result: &ParseFileResult, columns: &[(String, Option<Vec<String>>)]) -> Result<Vec<String>> {
    let mut row = Vec::new();
    for (name, entries) in columns {
        match result.stats.get(name) {
            None => match entries {
                Some(list) => row.extend(std::iter::repeat("NaN".to_string()).take(list.len())),
                None => row.push("NaN".to_string()),
            },
            Some(stat) => {
                let reduced = {
                    let guard = stat.lock().expect("stat mutex poisoned");
                    guard.reduced_content()?
                };
                match reduced {
                    ReducedContent::Scalar(v) => row.push(format_number(v)),
                    ReducedContent::Text(s) => row.push(s),
                    ReducedContent::Entries(map) => {
                        let declared = entries
                            .as_ref()
                            .expect("entry-bearing reduced content implies declared entries");
                        for entry in declared {
                            let value = map.get(entry).map(|v| format_number(*v)).unwrap_or_else(|| "NaN".to_string());
                            row.push(value);
                        }
                    }
                }
            }
        }
    }
    Ok(row)
}

fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use indexmap::IndexMap;
    use tempfile::tempdir;

    use super::*;
    use crate::core::stats::{Scalar, Stat, StatValue, Vector};

    fn result_with(file: &str, stats: Vec<(&str, Box<dyn Stat>)>) -> ParseFileResult {
        let stats: IndexMap<String, Arc<Mutex<Box<dyn Stat>>>> = stats
            .into_iter()
            .map(|(name, stat)| (name.to_string(), Arc::new(Mutex::new(stat))))
            .collect();
        ParseFileResult::new(PathBuf::from(file), stats)
    }

    #[test]
    fn test_scalar_mean_round_trip() {
        let mut scalar = Scalar::new("simTicks", 2);
        scalar.set_content(StatValue::Numeric(100.0)).unwrap();
        scalar.set_content(StatValue::Numeric(300.0)).unwrap();
        scalar.balance_content().unwrap();
        scalar.reduce_duplicates().unwrap();
        let result = result_with("a/stats.txt", vec![("simTicks", Box::new(scalar))]);

        let dir = tempdir().unwrap();
        let var_names = ["simTicks".to_string()];
        let output = finalize_parsing(dir.path(), &[result], Some(&var_names)).unwrap();
        let contents = fs::read_to_string(output).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "simTicks");
        assert_eq!(lines.next().unwrap(), "200.0");
    }

    #[test]
    fn test_missing_variable_emits_nan() {
        let result = result_with("a/stats.txt", vec![]);
        let dir = tempdir().unwrap();
        let var_names = ["simTicks".to_string()];
        let output = finalize_parsing(dir.path(), &[result], Some(&var_names)).unwrap();
        let contents = fs::read_to_string(output).unwrap();
        assert_eq!(contents.lines().nth(1).unwrap(), "NaN");
    }

    #[test]
    fn test_vector_header_uses_double_dot_separator() {
        let mut vector = Vector::new("system.cpu.ipc", 1, vec!["cpu0".into(), "cpu1".into()]);
        vector
            .set_content(StatValue::Entries(
                [("cpu0".to_string(), 1.5), ("cpu1".to_string(), 2.5)].into_iter().collect(),
            ))
            .unwrap();
        vector.balance_content().unwrap();
        vector.reduce_duplicates().unwrap();
        let result = result_with("a/stats.txt", vec![("system.cpu.ipc", Box::new(vector))]);
        let dir = tempdir().unwrap();
        let var_names = ["system.cpu.ipc".to_string()];
        let output = finalize_parsing(dir.path(), &[result], Some(&var_names)).unwrap();
        let contents = fs::read_to_string(output).unwrap();
        assert_eq!(
            contents.lines().next().unwrap(),
            "system.cpu.ipc..cpu0,system.cpu.ipc..cpu1"
        );
    }

    #[test]
    fn test_absent_var_names_falls_back_to_first_result_key_order() {
        let mut scalar = Scalar::new("simTicks", 1);
        scalar.set_content(StatValue::Numeric(1.0)).unwrap();
        scalar.balance_content().unwrap();
        scalar.reduce_duplicates().unwrap();
        let result = result_with("a/stats.txt", vec![("simTicks", Box::new(scalar))]);
        let dir = tempdir().unwrap();
        let output = finalize_parsing(dir.path(), &[result], None).unwrap();
        let contents = fs::read_to_string(output).unwrap();
        assert_eq!(contents.lines().next().unwrap(), "simTicks");
    }

    #[test]
    fn test_row_with_unfinalized_stat_is_omitted_not_fatal() {
        // A Stat that never had `balance_content`/`reduce_duplicates` run
        // (the worker pool normally guarantees this happens before a
        // result reaches the finalizer) must not abort the write for its
        // sibling rows.
        let unfinalized = Scalar::new("simTicks", 1);
        let bad_result = result_with("bad/stats.txt", vec![("simTicks", Box::new(unfinalized))]);

        let mut good_scalar = Scalar::new("simTicks", 1);
        good_scalar.set_content(StatValue::Numeric(42.0)).unwrap();
        good_scalar.balance_content().unwrap();
        good_scalar.reduce_duplicates().unwrap();
        let good_result = result_with("good/stats.txt", vec![("simTicks", Box::new(good_scalar))]);

        let dir = tempdir().unwrap();
        let var_names = ["simTicks".to_string()];
        let output = finalize_parsing(dir.path(), &[bad_result, good_result], Some(&var_names)).unwrap();
        let contents = fs::read_to_string(output).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "simTicks");
        assert_eq!(lines.next().unwrap(), "42.0");
        assert!(lines.next().is_none());
    }
}
