//! Distribution stat kind: fixed-range buckets with mandatory sentinels.

use indexmap::IndexMap;

use crate::core::errors::{IngestError, Result};
use crate::core::stats::base::{mean_over_repeat, pad_or_reject, BalanceGuard, ReducedContent, Stat, StatValue};
use crate::core::stats::StatKindTag;

/// Safety cap on the number of integer buckets a Distribution may declare,
/// per `spec.md` §3.
pub const BUCKET_SAFETY_CAP: i64 = 100_000;

const UNDERFLOWS: &str = "underflows";
const OVERFLOWS: &str = "overflows";

/// A range-bucketed statistic with mandatory `underflows`/`overflows`
/// sentinels and one bucket per integer in `[minimum, maximum]`.
#[derive(Debug)]
pub struct Distribution {
    variable: String,
    repeat: usize,
    mandatory_count: usize,
    declared_entries: Vec<String>,
    statistics_only: bool,
    content: IndexMap<String, Vec<f64>>,
    guard: BalanceGuard,
    reduced: Option<IndexMap<String, f64>>,
}

impl Distribution {
    /// Construct a new Distribution accumulator.
    ///
    /// Fails if `maximum < minimum` or if the resulting bucket count
    /// (`maximum - minimum + 1`) exceeds [`BUCKET_SAFETY_CAP`].
    ///
    /// `statistics_only` restricts `entries()` (and therefore the CSV
    /// output) to `extra_statistics`, suppressing the sentinel/range
    /// bucket columns while still requiring and accumulating them
    /// internally — `balance_content`/`reduce_duplicates` are unaffected.
    pub fn new(
        variable: impl Into<String>,
        repeat: usize,
        minimum: i64,
        maximum: i64,
        extra_statistics: Vec<String>,
        statistics_only: bool,
    ) -> Result<Self> {
        let variable = variable.into();
        if maximum < minimum {
            return Err(IngestError::construction_field(
                format!("distribution maximum {maximum} is less than minimum {minimum}"),
                "maximum",
            ));
        }
        let bucket_count = maximum - minimum + 1;
        if bucket_count > BUCKET_SAFETY_CAP {
            return Err(IngestError::construction(format!(
                "distribution bucket count {bucket_count} exceeds safety cap {BUCKET_SAFETY_CAP}"
            )));
        }

        let mut declared_entries =
            Vec::with_capacity(bucket_count as usize + 2 + extra_statistics.len());
        declared_entries.push(UNDERFLOWS.to_string());
        for i in minimum..=maximum {
            declared_entries.push(i.to_string());
        }
        declared_entries.push(OVERFLOWS.to_string());
        let mandatory_count = declared_entries.len();
        declared_entries.extend(extra_statistics);

        let content = declared_entries
            .iter()
            .map(|k| (k.clone(), Vec::new()))
            .collect();

        Ok(Self {
            variable,
            repeat,
            mandatory_count,
            declared_entries,
            statistics_only,
            content,
            guard: BalanceGuard::default(),
            reduced: None,
        })
    }
}

impl Stat for Distribution {
    fn set_content(&mut self, value: StatValue) -> Result<()> {
        match value {
            StatValue::Entries(map) => {
                for (key, v) in map {
                    match self.content.get_mut(&key) {
                        Some(list) => list.push(v),
                        None => {
                            return Err(IngestError::content_invariant(
                                &self.variable,
                                format!("unknown or out-of-range distribution bucket '{key}'"),
                            ))
                        }
                    }
                }
                Ok(())
            }
            _ => Err(IngestError::content_invariant(
                &self.variable,
                "Distribution requires an entry-keyed numeric observation",
            )),
        }
    }

    fn balance_content(&mut self) -> Result<()> {
        for (idx, key) in self.declared_entries.iter().enumerate() {
            let list = self
                .content
                .get_mut(key)
                .expect("declared entry always present in content map");
            if idx < self.mandatory_count && list.is_empty() {
                return Err(IngestError::content_invariant(
                    &self.variable,
                    format!("missing mandatory distribution key '{key}'"),
                ));
            }
            pad_or_reject(list, self.repeat, &self.variable)?;
        }
        self.guard.mark_balanced();
        Ok(())
    }

    fn reduce_duplicates(&mut self) -> Result<()> {
        self.guard.require_balanced(&self.variable)?;
        let mut reduced = IndexMap::with_capacity(self.declared_entries.len());
        for key in &self.declared_entries {
            let list = &self.content[key];
            reduced.insert(key.clone(), mean_over_repeat(list, self.repeat));
        }
        self.reduced = Some(reduced);
        self.guard.mark_reduced();
        Ok(())
    }

    fn entries(&self) -> Option<Vec<String>> {
        if self.statistics_only {
            Some(self.declared_entries[self.mandatory_count..].to_vec())
        } else {
            Some(self.declared_entries.clone())
        }
    }

    fn reduced_content(&self) -> Result<ReducedContent> {
        self.guard.ensure_finalized(&self.variable)?;
        Ok(ReducedContent::Entries(
            self.reduced
                .clone()
                .expect("reduced map must be populated once ensure_finalized succeeds"),
        ))
    }

    fn repeat(&self) -> usize {
        self.repeat
    }

    fn variable_name(&self) -> &str {
        &self.variable
    }

    fn kind_tag(&self) -> StatKindTag {
        StatKindTag::Distribution
    }
}
