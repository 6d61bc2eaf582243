//! Histogram stat kind: dynamically discovered range buckets with optional
//! proportional rebinning.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::errors::{IngestError, Result};
use crate::core::stats::base::{mean_over_repeat, pad_or_reject, BalanceGuard, ReducedContent, Stat, StatValue};
use crate::core::stats::StatKindTag;

static RANGE_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)-(\d+)$").unwrap());

fn parse_range_key(key: &str) -> Option<(f64, f64)> {
    let caps = RANGE_KEY.captures(key)?;
    let a: f64 = caps[1].parse().ok()?;
    let b: f64 = caps[2].parse().ok()?;
    Some((a, b))
}

/// Sort key used for dynamically discovered bucket keys: numeric ascent
/// for range-like keys, lexicographic fallback otherwise.
fn sort_key(key: &str) -> (u8, f64, &str) {
    match parse_range_key(key) {
        Some((a, _)) => (0, a, key),
        None => (1, 0.0, key),
    }
}

/// A dynamic-bucket statistic, optionally rebinned into uniform target
/// bins at reduce time.
#[derive(Debug)]
pub struct Histogram {
    variable: String,
    repeat: usize,
    bins: Option<usize>,
    max_range: Option<f64>,
    content: IndexMap<String, Vec<f64>>,
    guard: BalanceGuard,
    reduced: Option<IndexMap<String, f64>>,
}

impl Histogram {
    /// Construct a new Histogram accumulator. `bins`/`max_range` enable
    /// proportional rebinning at reduce time when both are `Some` and
    /// nonzero.
    pub fn new(
        variable: impl Into<String>,
        repeat: usize,
        bins: Option<usize>,
        max_range: Option<f64>,
    ) -> Self {
        Self {
            variable: variable.into(),
            repeat,
            bins: bins.filter(|b| *b > 0),
            max_range: max_range.filter(|r| *r > 0.0),
            content: IndexMap::new(),
            guard: BalanceGuard::default(),
            reduced: None,
        }
    }

    fn rebinning_active(&self) -> bool {
        self.bins.is_some() && self.max_range.is_some()
    }

    fn rebinned_target_keys(&self) -> Vec<String> {
        let bins = self.bins.expect("rebinning_active checked by caller");
        let max_range = self.max_range.expect("rebinning_active checked by caller");
        let w = max_range / bins as f64;
        (0..bins)
            .map(|k| {
                let lo = (k as f64 * w) as i64;
                let hi = ((k + 1) as f64 * w) as i64;
                format!("{lo}-{hi}")
            })
            .collect()
    }

    fn dynamic_sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<&String> = self.content.keys().collect();
        keys.sort_by(|a, b| {
            sort_key(a)
                .partial_cmp(&sort_key(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        keys.into_iter().cloned().collect()
    }

    fn pass_through_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .content
            .keys()
            .filter(|k| parse_range_key(k).is_none())
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl Stat for Histogram {
    fn set_content(&mut self, value: StatValue) -> Result<()> {
        match value {
            StatValue::Entries(map) => {
                for (key, v) in map {
                    self.content.entry(key).or_default().push(v);
                }
                Ok(())
            }
            _ => Err(IngestError::content_invariant(
                &self.variable,
                "Histogram requires an entry-keyed numeric observation",
            )),
        }
    }

    fn balance_content(&mut self) -> Result<()> {
        for list in self.content.values_mut() {
            pad_or_reject(list, self.repeat, &self.variable)?;
        }
        self.guard.mark_balanced();
        Ok(())
    }

    fn reduce_duplicates(&mut self) -> Result<()> {
        self.guard.require_balanced(&self.variable)?;

        if !self.rebinning_active() {
            let mut reduced = IndexMap::new();
            for key in self.dynamic_sorted_keys() {
                let list = &self.content[&key];
                reduced.insert(key.clone(), mean_over_repeat(list, self.repeat));
            }
            self.reduced = Some(reduced);
            self.guard.mark_reduced();
            return Ok(());
        }

        let bins = self.bins.expect("checked by rebinning_active");
        let max_range = self.max_range.expect("checked by rebinning_active");
        let w = max_range / bins as f64;
        let mut targets = vec![0.0_f64; bins];

        for (key, list) in &self.content {
            let Some((a, b)) = parse_range_key(key) else {
                continue;
            };
            let b_clipped = b.min(max_range);
            if b_clipped <= a {
                let k = ((a / w) as usize).min(bins - 1);
                let total: f64 = list.iter().sum();
                targets[k] += total;
                continue;
            }
            let width = b_clipped - a;
            let k_start = ((a / w).floor() as i64).max(0) as usize;
            let k_end = ((b_clipped / w).ceil() as i64).max(1) as usize;
            for k in k_start..k_end.min(bins) {
                let bucket_lo = k as f64 * w;
                let bucket_hi = (k + 1) as f64 * w;
                let overlap = (b_clipped.min(bucket_hi)) - (a.max(bucket_lo));
                if overlap <= 0.0 {
                    continue;
                }
                let weight = overlap / width;
                let total: f64 = list.iter().sum();
                targets[k] += total * weight;
            }
        }

        let mut reduced = IndexMap::with_capacity(bins);
        for (k, target_key) in self.rebinned_target_keys().into_iter().enumerate() {
            reduced.insert(target_key, targets[k] / self.repeat as f64);
        }
        for key in self.pass_through_keys() {
            let list = &self.content[&key];
            reduced.insert(key, mean_over_repeat(list, self.repeat));
        }

        self.reduced = Some(reduced);
        self.guard.mark_reduced();
        Ok(())
    }

    fn entries(&self) -> Option<Vec<String>> {
        if self.rebinning_active() {
            let mut keys = self.rebinned_target_keys();
            keys.extend(self.pass_through_keys());
            Some(keys)
        } else {
            Some(self.dynamic_sorted_keys())
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
        StatKindTag::Histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_histogram_no_rebinning_sorts_numerically() {
        let mut h = Histogram::new("h", 1, None, None);
        h.set_content(StatValue::Entries(entries(&[("10-19", 1.0), ("0-9", 2.0)])))
            .unwrap();
        h.balance_content().unwrap();
        assert_eq!(h.entries().unwrap(), vec!["0-9".to_string(), "10-19".to_string()]);
    }

    #[test]
    fn test_histogram_rebinning_preserves_total_mass() {
        let mut h = Histogram::new("h", 1, Some(2), Some(20.0));
        h.set_content(StatValue::Entries(entries(&[("0-9", 10.0), ("10-19", 10.0)])))
            .unwrap();
        h.balance_content().unwrap();
        h.reduce_duplicates().unwrap();
        let ReducedContent::Entries(reduced) = h.reduced_content().unwrap() else {
            panic!("expected entries");
        };
        let total: f64 = reduced.values().sum();
        assert!((total - 20.0).abs() < 1e-9);
    }
}
