//! Pattern Aggregator: collapses name families that vary only by integer
//! index into a single aggregate Scanned Variable (`spec.md` §4.5).

use std::collections::BTreeSet;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::model::ScannedVariable;
use crate::core::stats::StatKindTag;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

fn template_for(name: &str) -> String {
    DIGIT_RUN.replace_all(name, "#").to_string()
}

/// Build a full-match regex pattern from a `#`-templated name, escaping
/// every literal segment and inserting `\d+` at each varying position.
fn pattern_from_template(template: &str) -> String {
    template
        .split('#')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\d+")
}

struct Group {
    kind: StatKindTag,
    members: BTreeSet<String>,
    entries: BTreeSet<String>,
    minimum: Option<f64>,
    maximum: Option<f64>,
}

/// Collapse a raw list of per-file Scanned Variable lists into a single
/// aggregated catalog: name families differing only by integer index
/// become one aggregate variable with `pattern_indices` listing the
/// concrete constituent names; entry keys are deduplicated and sorted
/// across files; Distribution ranges take the union `[min, max]`.
pub fn aggregate_scan_results(per_file: Vec<Vec<ScannedVariable>>) -> Vec<ScannedVariable> {
    let mut groups: IndexMap<(String, StatKindTag), Group> = IndexMap::new();

    for variables in per_file {
        for variable in variables {
            let template = template_for(&variable.name);
            let key = (template, variable.kind);
            let group = groups.entry(key).or_insert_with(|| Group {
                kind: variable.kind,
                members: BTreeSet::new(),
                entries: BTreeSet::new(),
                minimum: None,
                maximum: None,
            });
            group.members.insert(variable.name.clone());
            group.entries.extend(variable.entries.iter().cloned());
            group.minimum = match (group.minimum, variable.minimum) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, None) => a,
                (None, b) => b,
            };
            group.maximum = match (group.maximum, variable.maximum) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, None) => a,
                (None, b) => b,
            };
        }
    }

    groups
        .into_iter()
        .map(|((template, _kind), group)| {
            let entries: Vec<String> = group.entries.into_iter().collect();
            if group.members.len() > 1 {
                let pattern_indices: Vec<String> = group.members.into_iter().collect();
                ScannedVariable {
                    name: pattern_from_template(&template),
                    kind: group.kind,
                    entries,
                    minimum: group.minimum,
                    maximum: group.maximum,
                    pattern_indices: Some(pattern_indices),
                }
            } else {
                let name = group
                    .members
                    .into_iter()
                    .next()
                    .expect("group always has at least one member");
                ScannedVariable {
                    name,
                    kind: group.kind,
                    entries,
                    minimum: group.minimum,
                    maximum: group.maximum,
                    pattern_indices: None,
                }
            }
        })
        .collect()
}
