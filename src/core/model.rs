//! Core data model shared across the pipeline: Scanned Variable, Stat
//! Request, and Parse Batch Result (`spec.md` §3).

use serde::{Deserialize, Serialize};

use crate::core::pool::work::ParseFileResult;
use crate::core::stats::StatKindTag;

/// Kind-specific construction/reduction parameters carried by a
/// [`StatRequest`]. Only the fields relevant to the request's `kind` are
/// consulted by the Type Registry & Mapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatParams {
    /// Declared entry keys (Vector).
    pub entries: Option<Vec<String>>,
    /// Inclusive lower bound (Distribution).
    pub minimum: Option<i64>,
    /// Inclusive upper bound (Distribution).
    pub maximum: Option<i64>,
    /// Additional accepted bucket keys beyond the sentinel/range set
    /// (Distribution).
    pub extra_statistics: Option<Vec<String>>,
    /// Target bin count for rebinning (Histogram).
    pub bins: Option<usize>,
    /// Target bin range for rebinning (Histogram).
    pub max_range: Option<f64>,
    /// Default value when no observation was seen (Configuration).
    pub on_empty: Option<String>,
    /// Concrete constituent ids collected by the Regex Expander, or
    /// the Pattern Aggregator's aggregate membership. A non-empty value
    /// here sets the constructed Stat's `repeat` to its length.
    pub parsed_ids: Option<Vec<String>>,
}

/// An immutable request for one variable (concrete or regex pattern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatRequest {
    /// Concrete variable name, or a regex pattern when `is_regex`.
    pub name: String,
    /// Which Stat variant to construct.
    pub kind: StatKindTag,
    /// Expected observation count per file.
    pub repeat: usize,
    /// Kind-specific parameters.
    pub params: StatParams,
    /// Restrict Distribution output to summary statistics only,
    /// suppressing per-bucket columns.
    pub statistics_only: bool,
    /// Whether `name` should be treated as a regex pattern by the Regex
    /// Expander.
    pub is_regex: bool,
}

impl StatRequest {
    /// Construct a concrete (non-regex) request with no extra params.
    pub fn concrete(name: impl Into<String>, kind: StatKindTag, repeat: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            repeat,
            params: StatParams::default(),
            statistics_only: false,
            is_regex: false,
        }
    }

    /// Return a clone of this request with `params.parsed_ids` set, as
    /// produced by the Regex Expander (`spec.md` §4.6) or the Pattern
    /// Aggregator membership resolution.
    pub fn with_parsed_ids(&self, ids: Vec<String>) -> Self {
        let mut clone = self.clone();
        clone.params.parsed_ids = Some(ids);
        clone
    }

    /// The effective repeat count: `len(parsed_ids)` when expanded,
    /// otherwise the request's own `repeat`, per `spec.md` §4.2.
    pub fn effective_repeat(&self) -> usize {
        self.params
            .parsed_ids
            .as_ref()
            .map(|ids| ids.len())
            .filter(|&n| n > 0)
            .unwrap_or(self.repeat)
    }
}

/// An immutable description of a variable discovered by the Scanner,
/// consumed by the Regex Expander.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedVariable {
    /// The discovered variable name, or (after Pattern Aggregator
    /// collapsing) a regex with `\d+` inserted at varying positions.
    pub name: String,
    /// The inferred kind.
    pub kind: StatKindTag,
    /// Entry keys, for entry-bearing kinds; empty otherwise.
    pub entries: Vec<String>,
    /// Observed minimum, for Distribution, when determinable.
    pub minimum: Option<f64>,
    /// Observed maximum, for Distribution, when determinable.
    pub maximum: Option<f64>,
    /// For an aggregated entry, the concrete constituent names it stands
    /// in for.
    pub pattern_indices: Option<Vec<String>>,
}

/// Immutable pairing of a batch's result futures with the ordered
/// variable-name list that fixes CSV column order (`spec.md` §3, §5).
pub struct ParseBatchResult {
    /// One future per submitted Parse Work, in submission order.
    pub futures: Vec<tokio::task::JoinHandle<crate::core::errors::Result<ParseFileResult>>>,
    /// The ordered variable-name list governing CSV columns.
    pub var_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_repeat_uses_parsed_ids_length() {
        let req = StatRequest::concrete("system.cpu.ipc", StatKindTag::Scalar, 1)
            .with_parsed_ids(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(req.effective_repeat(), 3);
    }

    #[test]
    fn test_effective_repeat_falls_back_without_parsed_ids() {
        let req = StatRequest::concrete("simTicks", StatKindTag::Scalar, 2);
        assert_eq!(req.effective_repeat(), 2);
    }
}
