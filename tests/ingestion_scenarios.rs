//! End-to-end scenarios from `spec.md` §8, driven through the public
//! library surface: build a Stat-by-name map from requests, feed it a
//! synthetic tokenizer record stream (standing in for the subprocess
//! boundary), then finalize to CSV and assert on its bytes.

use std::fs;
use std::time::Duration;

use ring5_ingest::core::model::{ScannedVariable, StatRequest};
use ring5_ingest::core::parsing::expand_requests;
use ring5_ingest::core::pool::{ParseFileResult, ParseWork, WorkerPool};
use ring5_ingest::core::stats::{ReducedContent, StatKindTag};
use ring5_ingest::core::strategy::simple::build_stat_map;
use ring5_ingest::io::finalize_parsing;

// `parse_file_into_stats` and `TokenRecord` are internal to `core::parsing`
// but public within the crate's module tree; pull them in via the crate root.
use ring5_ingest::core::parsing::{parse_file_into_stats, TokenRecord};

fn record(kind: &str, name: &str, value: &str) -> TokenRecord {
    TokenRecord {
        kind_tag: kind.to_string(),
        qualified_name: name.to_string(),
        value: value.to_string(),
    }
}

/// S1 — Scalar mean over repeats.
#[test]
fn scalar_mean_over_repeats() {
    let requests = vec![StatRequest::concrete("simTicks", StatKindTag::Scalar, 2)];
    let stats = build_stat_map(&requests).unwrap();
    let records = vec![
        record("scalar", "simTicks", "100"),
        record("scalar", "simTicks", "300"),
    ];
    parse_file_into_stats(&records, &stats).unwrap();

    let result = ParseFileResult::new("run0/stats.txt".into(), stats);
    let dir = tempfile::tempdir().unwrap();
    let var_names = vec!["simTicks".to_string()];
    let out = finalize_parsing(dir.path(), &[result], Some(&var_names)).unwrap();
    let contents = fs::read_to_string(out).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next().unwrap(), "simTicks");
    assert_eq!(lines.next().unwrap(), "200.0");
}

/// S2 — Vector with declared entries, padding missing entries to 0.
#[test]
fn vector_padding_for_missing_entry() {
    let mut request = StatRequest::concrete("system.cpu.ipc", StatKindTag::Vector, 1);
    request.params.entries = Some(vec!["cpu0".into(), "cpu1".into(), "cpu2".into()]);
    let stats = build_stat_map(&[request]).unwrap();

    let records = vec![
        record("vector", "system.cpu.ipc::cpu0", "1.5"),
        record("vector", "system.cpu.ipc::cpu1", "2.5"),
    ];
    parse_file_into_stats(&records, &stats).unwrap();

    let result = ParseFileResult::new("run0/stats.txt".into(), stats);
    let dir = tempfile::tempdir().unwrap();
    let var_names = vec!["system.cpu.ipc".to_string()];
    let out = finalize_parsing(dir.path(), &[result], Some(&var_names)).unwrap();
    let contents = fs::read_to_string(out).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next().unwrap(),
        "system.cpu.ipc..cpu0,system.cpu.ipc..cpu1,system.cpu.ipc..cpu2"
    );
    assert_eq!(lines.next().unwrap(), "1.5,2.5,0.0");
}

/// Writes a fixture tokenizer to `dir`: a shell script that, given a file
/// path argument, cats the sibling `<path>.tokens` file to stdout. Stands
/// in for the real subprocess boundary `run_tokenizer` shells out to.
#[cfg(unix)]
fn write_fixture_tokenizer(dir: &std::path::Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script_path = dir.join("fixture-tokenizer.sh");
    fs::write(&script_path, "#!/bin/sh\ncat \"$1.tokens\"\n").unwrap();
    let mut perms = fs::metadata(&script_path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script_path, perms).unwrap();
    script_path
}

/// S3 — Distribution missing the `overflows` sentinel fails its own Work
/// (via `WorkerPool::submit_batch`/`execute_one`, not a direct
/// `balance_content` call), while a sibling Work still succeeds.
#[cfg(unix)]
#[tokio::test]
async fn distribution_missing_sentinel_fails_its_work_not_its_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let tokenizer = write_fixture_tokenizer(dir.path());

    let bad_file = dir.path().join("bad_stats.txt");
    fs::write(&bad_file, "").unwrap();
    let mut bad_tokens = String::new();
    for i in 0..=10 {
        bad_tokens.push_str(&format!("distribution/system.mem.dist::{i}/1\n"));
    }
    bad_tokens.push_str("distribution/system.mem.dist::underflows/1\n");
    // "overflows" deliberately omitted.
    fs::write(bad_file.with_extension("txt.tokens"), bad_tokens).unwrap();

    let good_file = dir.path().join("good_stats.txt");
    fs::write(&good_file, "").unwrap();
    fs::write(good_file.with_extension("txt.tokens"), "scalar/simTicks/100\n").unwrap();

    let mut bad_request = StatRequest::concrete("system.mem.dist", StatKindTag::Distribution, 1);
    bad_request.params.minimum = Some(0);
    bad_request.params.maximum = Some(10);
    let bad_stats = build_stat_map(&[bad_request]).unwrap();

    let good_request = StatRequest::concrete("simTicks", StatKindTag::Scalar, 1);
    let good_stats = build_stat_map(&[good_request]).unwrap();

    let pool = WorkerPool::new(tokenizer, 2, Duration::from_secs(5));
    let batch = pool.submit_batch(
        vec![
            ParseWork::new(bad_file, bad_stats),
            ParseWork::new(good_file.clone(), good_stats),
        ],
        vec!["system.mem.dist".to_string(), "simTicks".to_string()],
    );

    let mut results = Vec::new();
    for handle in batch.futures {
        results.push(handle.await.unwrap());
    }

    assert!(
        results[0].is_err(),
        "a Distribution missing its mandatory sentinel must fail its own Work's future"
    );
    let good = results
        .remove(1)
        .expect("the sibling Work must still succeed despite the other Work's failure");
    assert_eq!(good.file_path, good_file);
}

/// S4 — Regex expansion collects concrete constituent ids and sets repeat.
#[test]
fn regex_expansion_collects_constituent_ids() {
    let catalog = vec![
        scanned_scalar("system.cpu0.ipc"),
        scanned_scalar("system.cpu1.ipc"),
        scanned_scalar("system.cpu2.ipc"),
    ];
    let mut request = StatRequest::concrete(r"system\.cpu\d+\.ipc", StatKindTag::Scalar, 1);
    request.is_regex = true;
    let expanded = expand_requests(&[request], &catalog);

    let ids = expanded[0].params.parsed_ids.clone().unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(expanded[0].effective_repeat(), 3);
}

/// S5 — Spatial sum within a file, then temporal mean across two files.
#[test]
fn spatial_then_temporal_aggregation() {
    let request = StatRequest::concrete("system.cpu.ipc", StatKindTag::Scalar, 3).with_parsed_ids(vec![
        "system.cpu0.ipc".into(),
        "system.cpu1.ipc".into(),
        "system.cpu2.ipc".into(),
    ]);

    let mut reduced_per_file = Vec::new();
    for values in [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]] {
        let stats = build_stat_map(std::slice::from_ref(&request)).unwrap();
        let records: Vec<TokenRecord> = ["system.cpu0.ipc", "system.cpu1.ipc", "system.cpu2.ipc"]
            .iter()
            .zip(values.iter())
            .map(|(name, v)| record("scalar", name, &v.to_string()))
            .collect();
        parse_file_into_stats(&records, &stats).unwrap();

        let stat = stats["system.cpu.ipc"].clone();
        let mut guard = stat.lock().unwrap();
        guard.balance_content().unwrap();
        guard.reduce_duplicates().unwrap();
        let ReducedContent::Scalar(reduced) = guard.reduced_content().unwrap() else {
            panic!("expected scalar reduced content");
        };
        reduced_per_file.push(reduced);
    }

    assert_eq!(reduced_per_file, vec![2.0, 5.0]);
}

/// S6 — A literal name with dots is never treated as a regex wildcard.
#[test]
fn literal_dot_name_is_not_a_regex() {
    let catalog = vec![scanned_scalar("systemXcpuXipc")];
    let request = StatRequest::concrete("system.cpu.ipc", StatKindTag::Scalar, 1);
    let expanded = expand_requests(&[request], &catalog);
    assert!(expanded[0].params.parsed_ids.is_none());
}

fn scanned_scalar(name: &str) -> ScannedVariable {
    ScannedVariable {
        name: name.to_string(),
        kind: StatKindTag::Scalar,
        entries: Vec::new(),
        minimum: None,
        maximum: None,
        pattern_indices: None,
    }
}
