//! Tokenizer subprocess contract (`spec.md` §4.7, §6).
//!
//! The tokenizer is kept as an external process for this first cut, per
//! the re-architecture note in `spec.md` §9: its stdout contract is
//! specified here precisely enough that a native in-process parser could
//! later replace it without touching any other component.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

use crate::core::errors::{IngestError, Result};

/// One raw tokenizer record: kind-tag, qualified-name, value. Values are
/// kept as strings to preserve the tokenizer's original numeric
/// precision until the Line Parser converts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// One of `scalar | vector | histogram | distribution | summary |
    /// configuration`, case-insensitive.
    pub kind_tag: String,
    /// Either a bare name or `base::entry`.
    pub qualified_name: String,
    /// The original-precision value string.
    pub value: String,
}

/// Invoke the tokenizer subprocess over `file_path`, restricted to
/// `names`, and parse its stdout record stream.
///
/// Names beginning with `-` are excluded from the argument list before
/// the command is built (flag-injection defense, `spec.md` §4.3).
pub async fn run_tokenizer(
    tokenizer_path: &Path,
    file_path: &Path,
    names: &[String],
    per_work_timeout: Duration,
) -> Result<Vec<TokenRecord>> {
    let safe_names: Vec<&str> = names
        .iter()
        .filter(|n| {
            let keep = !n.starts_with('-');
            if !keep {
                warn!(name = %n, "refusing to pass flag-like variable name to tokenizer");
            }
            keep
        })
        .map(String::as_str)
        .collect();
    let joined = safe_names.join(",");

    let mut command = Command::new(tokenizer_path);
    command.arg(file_path).arg(&joined);

    let spawn_result = timeout(per_work_timeout, command.output())
        .await
        .map_err(|_| {
            IngestError::transient(
                "tokenizer",
                format!("tokenizer timed out after {per_work_timeout:?} on {}", file_path.display()),
            )
        })?;

    let output = spawn_result.map_err(|e| IngestError::io("failed to spawn tokenizer", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IngestError::transient(
            "tokenizer",
            format!("tokenizer exited with {}: {stderr}", output.status),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_records(&stdout)
}

fn parse_records(stdout: &str) -> Result<Vec<TokenRecord>> {
    let mut records = Vec::new();
    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.splitn(3, '/');
        let kind_tag = parts.next().ok_or_else(|| {
            IngestError::transient("tokenizer", format!("malformed record (missing kind tag): {line}"))
        })?;
        let qualified_name = parts.next().ok_or_else(|| {
            IngestError::transient("tokenizer", format!("malformed record (missing name): {line}"))
        })?;
        let value = parts.next().ok_or_else(|| {
            IngestError::transient("tokenizer", format!("malformed record (missing value): {line}"))
        })?;
        records.push(TokenRecord {
            kind_tag: kind_tag.to_string(),
            qualified_name: qualified_name.to_string(),
            value: value.to_string(),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_skips_empty_lines() {
        let stdout = "scalar/simTicks/100\n\nvector/system.cpu.ipc::cpu0/1.5\n";
        let records = parse_records(stdout).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind_tag, "scalar");
        assert_eq!(records[1].qualified_name, "system.cpu.ipc::cpu0");
    }

    #[test]
    fn test_parse_records_rejects_malformed_line() {
        let stdout = "scalar/simTicks\n";
        assert!(parse_records(stdout).is_err());
    }
}
