//! Scanner: discovers the variable catalog of a single file
//! (`spec.md` §4.4, §6).

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::errors::{IngestError, Result};
use crate::core::model::ScannedVariable;
use crate::core::stats::StatKindTag;

#[derive(Debug, Deserialize)]
struct RawScannedVariable {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    entries: Vec<String>,
    minimum: Option<f64>,
    maximum: Option<f64>,
}

/// Check that the scanner executable exists, per the Scanner's
/// dependency-check-on-construction contract (`spec.md` §4.4): failure to
/// locate it is a hard error raised immediately, not deferred to first use.
pub fn ensure_scanner_available(scanner_path: &Path) -> Result<()> {
    if scanner_path.components().count() == 1 {
        // A bare executable name is resolved via PATH at spawn time; we
        // cannot cheaply verify it here without spawning, so we defer to
        // the first invocation's error in that case.
        return Ok(());
    }
    if !scanner_path.exists() {
        return Err(IngestError::construction(format!(
            "scanner executable not found at {}",
            scanner_path.display()
        )));
    }
    Ok(())
}

/// Invoke the scanner subprocess over a single file, returning the
/// variables it discovered.
pub async fn scan_file(
    scanner_path: &Path,
    file_path: &Path,
    hints: &[String],
    per_work_timeout: Duration,
) -> Result<Vec<ScannedVariable>> {
    let mut command = Command::new(scanner_path);
    command.arg(file_path);
    if !hints.is_empty() {
        command.arg(hints.join(","));
    }

    let output = timeout(per_work_timeout, command.output())
        .await
        .map_err(|_| {
            IngestError::transient(
                "scanner",
                format!("scanner timed out after {per_work_timeout:?} on {}", file_path.display()),
            )
        })?
        .map_err(|e| IngestError::io("failed to spawn scanner", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IngestError::transient(
            "scanner",
            format!("scanner exited with {}: {stderr}", output.status),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let raw: Vec<RawScannedVariable> = serde_json::from_str(trimmed)
        .map_err(|e| IngestError::transient("scanner", format!("malformed scanner JSON: {e}")))?;

    raw.into_iter()
        .map(|r| {
            let kind = StatKindTag::from_wire_tag(&r.kind).ok_or_else(|| {
                IngestError::content_invariant(&r.name, format!("unknown scanner-reported kind '{}'", r.kind))
            })?;
            Ok(ScannedVariable {
                name: r.name,
                kind,
                entries: r.entries,
                minimum: r.minimum,
                maximum: r.maximum,
                pattern_indices: None,
            })
        })
        .collect()
}

/// Scan many files in parallel, bounded by `limit` concurrent scanner
/// invocations (`limit == -1` meaning no limit), per `spec.md` §4.4, §5.
pub async fn scan_files_parallel(
    scanner_path: &Path,
    files: Vec<PathBuf>,
    limit: i64,
    per_work_timeout: Duration,
) -> Vec<Result<Vec<ScannedVariable>>> {
    let concurrency = if limit <= 0 {
        files.len().max(1)
    } else {
        limit as usize
    };

    let mut futures = FuturesUnordered::new();
    let mut results = Vec::with_capacity(files.len());
    let mut iter = files.into_iter();

    for file in iter.by_ref().take(concurrency) {
        futures.push(scan_file(scanner_path, &file, &[], per_work_timeout));
    }

    while let Some(result) = futures.next().await {
        results.push(result);
        if let Some(next_file) = iter.next() {
            futures.push(scan_file(scanner_path, &next_file, &[], per_work_timeout));
        }
    }

    results
}
