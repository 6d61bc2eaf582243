//! Regex Expander: resolves regex-marked Stat Requests against a scanned
//! catalog (`spec.md` §4.6).

use regex::Regex;
use tracing::warn;

use crate::core::model::{ScannedVariable, StatRequest};

/// Expand every regex-marked request in `requests` against `catalog`.
///
/// For each request with `is_regex = true`, compile `name` as a
/// full-match regex and collect every catalog entry that equals it
/// literally or full-matches it. Matches carrying `pattern_indices`
/// contribute their constituent names; matches without contribute their
/// own name. A request that collects at least one concrete id is
/// rewritten with `params.parsed_ids` set; a request that matches nothing,
/// or whose pattern fails to compile, passes through unchanged.
/// `is_regex = false` requests always pass through unchanged, regardless
/// of what characters their literal `name` contains.
pub fn expand_requests(requests: &[StatRequest], catalog: &[ScannedVariable]) -> Vec<StatRequest> {
    requests
        .iter()
        .map(|request| expand_one(request, catalog))
        .collect()
}

fn expand_one(request: &StatRequest, catalog: &[ScannedVariable]) -> StatRequest {
    if !request.is_regex {
        return request.clone();
    }

    let pattern = match Regex::new(&format!("^(?:{})$", request.name)) {
        Ok(p) => p,
        Err(e) => {
            warn!(pattern = %request.name, error = %e, "regex expander: malformed pattern, passing request through unexpanded");
            return request.clone();
        }
    };

    let mut collected = Vec::new();
    for scanned in catalog {
        let matches = scanned.name == request.name || pattern.is_match(&scanned.name);
        if !matches {
            continue;
        }
        match &scanned.pattern_indices {
            Some(indices) => collected.extend(indices.iter().cloned()),
            None => collected.push(scanned.name.clone()),
        }
    }

    if collected.is_empty() {
        request.clone()
    } else {
        request.with_parsed_ids(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stats::StatKindTag;

    fn scanned(name: &str, pattern_indices: Option<Vec<&str>>) -> ScannedVariable {
        ScannedVariable {
            name: name.to_string(),
            kind: StatKindTag::Scalar,
            entries: Vec::new(),
            minimum: None,
            maximum: None,
            pattern_indices: pattern_indices.map(|v| v.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn test_expands_regex_against_individual_matches() {
        let catalog = vec![
            scanned("system.cpu0.ipc", None),
            scanned("system.cpu1.ipc", None),
            scanned("system.cpu2.ipc", None),
        ];
        let request = StatRequest {
            name: r"system\.cpu\d+\.ipc".to_string(),
            kind: StatKindTag::Scalar,
            repeat: 1,
            params: Default::default(),
            statistics_only: false,
            is_regex: true,
        };
        let expanded = expand_requests(&[request], &catalog);
        let ids = expanded[0].params.parsed_ids.clone().unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(expanded[0].effective_repeat(), 3);
    }

    #[test]
    fn test_literal_dot_is_not_treated_as_wildcard() {
        let catalog = vec![scanned("systemXcpuXipc", None)];
        let request = StatRequest::concrete("system.cpu.ipc", StatKindTag::Scalar, 1);
        let expanded = expand_requests(&[request], &catalog);
        assert!(expanded[0].params.parsed_ids.is_none());
    }

    #[test]
    fn test_malformed_regex_passes_through() {
        let request = StatRequest {
            name: "(unclosed".to_string(),
            kind: StatKindTag::Scalar,
            repeat: 1,
            params: Default::default(),
            statistics_only: false,
            is_regex: true,
        };
        let expanded = expand_requests(&[request.clone()], &[]);
        assert_eq!(expanded[0].name, request.name);
        assert!(expanded[0].params.parsed_ids.is_none());
    }

    #[test]
    fn test_aggregate_match_uses_pattern_indices() {
        let catalog = vec![scanned(
            r"system\.cpu\d+\.ipc",
            Some(vec!["system.cpu0.ipc", "system.cpu1.ipc"]),
        )];
        let request = StatRequest {
            name: r"system\.cpu\d+\.ipc".to_string(),
            kind: StatKindTag::Scalar,
            repeat: 1,
            params: Default::default(),
            statistics_only: false,
            is_regex: true,
        };
        let expanded = expand_requests(&[request], &catalog);
        assert_eq!(expanded[0].params.parsed_ids.clone().unwrap().len(), 2);
    }
}
