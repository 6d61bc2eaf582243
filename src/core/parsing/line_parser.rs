//! Line Parser: reconciles a tokenizer's record stream against a file's
//! requested Stat-by-name map (`spec.md` §4.3).

use indexmap::IndexMap;
use tracing::warn;

use crate::core::errors::{IngestError, Result};
use crate::core::parsing::tokenizer::TokenRecord;
use crate::core::pool::work::StatMap;
use crate::core::stats::{StatKindTag, StatValue};

/// Feed a tokenizer's record stream into `stats`, the per-file
/// Stat-by-name map. Stats not represented in `records` are left at their
/// default (empty) state; the later balance step pads them.
pub fn parse_file_into_stats(records: &[TokenRecord], stats: &StatMap) -> Result<()> {
    let mut buffer: IndexMap<String, IndexMap<String, f64>> = IndexMap::new();

    for record in records {
        let Some(tag) = StatKindTag::from_wire_tag(&record.kind_tag) else {
            return Err(IngestError::content_invariant(
                &record.qualified_name,
                format!("unknown tokenizer kind-tag '{}'", record.kind_tag),
            ));
        };

        if let Some((base, entry)) = record.qualified_name.split_once("::") {
            accumulate_entry(&mut buffer, stats, tag, base, entry, &record.value)?;
            continue;
        }

        match tag {
            StatKindTag::Configuration => {
                if let Some(stat) = stats.get(&record.qualified_name) {
                    let mut guard = stat.lock().expect("stat mutex poisoned");
                    if guard.kind_tag() == StatKindTag::Configuration {
                        guard.set_content(StatValue::Text(record.value.clone()))?;
                    }
                }
                // Base not requested: skip silently per spec.md §4.3.
            }
            _ => {
                if let Some(stat) = stats.get(&record.qualified_name) {
                    let mut guard = stat.lock().expect("stat mutex poisoned");
                    if tag.reconcilable_with(guard.kind_tag()) {
                        let value: f64 = record.value.parse().map_err(|_| {
                            IngestError::content_invariant(
                                &record.qualified_name,
                                format!("non-numeric value '{}' for a numeric stat", record.value),
                            )
                        })?;
                        guard.set_content(StatValue::Numeric(value))?;
                    }
                    // Kind cannot be reconciled: skip silently.
                }
                // Base not requested: skip silently per spec.md §4.3.
            }
        }
    }

    for (base, entries) in buffer {
        if let Some(stat) = stats.get(&base) {
            let mut guard = stat.lock().expect("stat mutex poisoned");
            guard.set_content(StatValue::Entries(entries))?;
        }
        // Base not requested: no Stat to deliver it to; already dropped
        // silently per spec.md §4.3 (or skipped earlier via `accumulate_entry`).
    }

    Ok(())
}

fn accumulate_entry(
    buffer: &mut IndexMap<String, IndexMap<String, f64>>,
    stats: &StatMap,
    tag: StatKindTag,
    base: &str,
    entry: &str,
    raw_value: &str,
) -> Result<()> {
    let Some(stat) = stats.get(base) else {
        return Ok(()); // base not requested: skip silently.
    };
    let requested_kind = {
        let guard = stat.lock().expect("stat mutex poisoned");
        guard.kind_tag()
    };
    if !tag.reconcilable_with(requested_kind) {
        warn!(base, %entry, tag = %tag_name(tag), "skipping record: kind cannot be reconciled with requested kind");
        return Ok(());
    }

    let value: f64 = raw_value.parse().map_err(|_| {
        IngestError::content_invariant(base, format!("non-numeric value '{raw_value}' for entry '{entry}'"))
    })?;

    // Spatial aggregation: multiple raw numbers contributing to the same
    // bucket within one file are summed before they are appended as a
    // single observation (spec.md §4.1).
    *buffer
        .entry(base.to_string())
        .or_default()
        .entry(entry.to_string())
        .or_insert(0.0) += value;

    Ok(())
}

fn tag_name(tag: StatKindTag) -> &'static str {
    match tag {
        StatKindTag::Scalar => "scalar",
        StatKindTag::Vector => "vector",
        StatKindTag::Distribution => "distribution",
        StatKindTag::Histogram => "histogram",
        StatKindTag::Configuration => "configuration",
    }
}
