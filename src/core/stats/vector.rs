//! Vector stat kind: declared entry keys, each with its own observation list.

use indexmap::IndexMap;
use tracing::warn;

use crate::core::errors::{IngestError, Result};
use crate::core::stats::base::{mean_over_repeat, pad_or_reject, BalanceGuard, ReducedContent, Stat, StatValue};
use crate::core::stats::StatKindTag;

/// A multi-entry statistic with a fixed, caller-declared set of entry
/// keys (e.g. per-core counters).
#[derive(Debug)]
pub struct Vector {
    variable: String,
    repeat: usize,
    declared_entries: Vec<String>,
    content: IndexMap<String, Vec<f64>>,
    guard: BalanceGuard,
    reduced: Option<IndexMap<String, f64>>,
}

impl Vector {
    /// Construct a new Vector accumulator with the given declared entries.
    pub fn new(variable: impl Into<String>, repeat: usize, declared_entries: Vec<String>) -> Self {
        let content = declared_entries
            .iter()
            .map(|e| (e.clone(), Vec::new()))
            .collect();
        Self {
            variable: variable.into(),
            repeat,
            declared_entries,
            content,
            guard: BalanceGuard::default(),
            reduced: None,
        }
    }
}

impl Stat for Vector {
    fn set_content(&mut self, value: StatValue) -> Result<()> {
        match value {
            StatValue::Entries(map) => {
                for (key, v) in map {
                    if let Some(list) = self.content.get_mut(&key) {
                        list.push(v);
                    } else {
                        warn!(variable = %self.variable, entry = %key, "dropping unknown vector entry");
                    }
                }
                Ok(())
            }
            _ => Err(IngestError::content_invariant(
                &self.variable,
                "Vector requires an entry-keyed numeric observation",
            )),
        }
    }

    fn balance_content(&mut self) -> Result<()> {
        for key in &self.declared_entries {
            let list = self
                .content
                .get_mut(key)
                .expect("declared entry always present in content map");
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
        Some(self.declared_entries.clone())
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
        StatKindTag::Vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries_map(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_vector_padding_for_missing_entry() {
        let mut v = Vector::new(
            "system.cpu.ipc",
            1,
            vec!["cpu0".into(), "cpu1".into(), "cpu2".into()],
        );
        v.set_content(StatValue::Entries(entries_map(&[("cpu0", 1.5), ("cpu1", 2.5)])))
            .unwrap();
        v.balance_content().unwrap();
        v.reduce_duplicates().unwrap();
        let ReducedContent::Entries(reduced) = v.reduced_content().unwrap() else {
            panic!("expected entries");
        };
        assert_eq!(reduced["cpu0"], 1.5);
        assert_eq!(reduced["cpu1"], 2.5);
        assert_eq!(reduced["cpu2"], 0.0);
    }

    #[test]
    fn test_vector_drops_unknown_entry() {
        let mut v = Vector::new("v", 1, vec!["cpu0".into()]);
        v.set_content(StatValue::Entries(entries_map(&[("cpu0", 1.0), ("cpuX", 9.0)])))
            .unwrap();
        v.balance_content().unwrap();
        v.reduce_duplicates().unwrap();
        let ReducedContent::Entries(reduced) = v.reduced_content().unwrap() else {
            panic!("expected entries");
        };
        assert_eq!(reduced.len(), 1);
    }
}
