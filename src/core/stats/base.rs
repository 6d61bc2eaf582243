//! Shared accumulation/guard machinery for the five Stat kinds.

use std::fmt;

use crate::core::errors::{IngestError, Result};
use crate::core::stats::StatKindTag;

/// Raw observation appended to a Stat's content via `set_content`.
///
/// Shape depends on kind: `Numeric` for Scalar, `Entries` for the
/// entry-bearing kinds (Vector, Distribution, Histogram) with each entry's
/// raw constituents already spatially summed by the caller, `Text` for
/// Configuration.
#[derive(Debug, Clone)]
pub enum StatValue {
    /// A single numeric observation (Scalar).
    Numeric(f64),
    /// A map of entry-key to numeric observation (Vector, Distribution,
    /// Histogram).
    Entries(indexmap::IndexMap<String, f64>),
    /// A string-coercible observation (Configuration).
    Text(String),
}

/// The finalized value of a Stat after `balance_content()` and
/// `reduce_duplicates()` have both run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReducedContent {
    /// A single numeric value (Scalar).
    Scalar(f64),
    /// A map of entry-key to numeric value (Vector, Distribution,
    /// Histogram).
    Entries(indexmap::IndexMap<String, f64>),
    /// A single string value (Configuration).
    Text(String),
}

/// Common trait implemented by each of the five Stat kinds.
///
/// Mirrors `spec.md` §4.1: no attribute mutation outside the declared
/// field set is possible because each variant is a plain struct with
/// private fields, and `reduced_content()` is read-guarded by two
/// one-shot flags rather than any runtime reflection trick.
pub trait Stat: fmt::Debug + Send {
    /// Append one observation. See `StatValue` for the expected shape
    /// per kind.
    fn set_content(&mut self, value: StatValue) -> Result<()>;

    /// Pad or validate accumulated content against `repeat`. Idempotent
    /// only in the sense that it must be called exactly once; calling it
    /// twice re-applies the same padding logic (callers are expected to
    /// call it once per Stat lifecycle as §3 specifies).
    fn balance_content(&mut self) -> Result<()>;

    /// Collapse per-bucket observation lists into single reduced values.
    fn reduce_duplicates(&mut self) -> Result<()>;

    /// Ordered list of entry keys for entry-bearing kinds; `None` for
    /// Scalar and Configuration.
    fn entries(&self) -> Option<Vec<String>>;

    /// The finalized value. Fails unless both `balance_content()` and
    /// `reduce_duplicates()` have already run.
    fn reduced_content(&self) -> Result<ReducedContent>;

    /// The configured repeat count for this instance.
    fn repeat(&self) -> usize;

    /// The variable name this instance accumulates, used for error
    /// messages and logging.
    fn variable_name(&self) -> &str;

    /// Which kind tag this instance was constructed as, used by the Line
    /// Parser to reconcile the tokenizer's wire kind-tag against the
    /// requested kind (`spec.md` §4.3).
    fn kind_tag(&self) -> StatKindTag;
}

/// The one-shot `balanced`/`reduced` flag pair shared by every kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct BalanceGuard {
    balanced: bool,
    reduced: bool,
}

impl BalanceGuard {
    /// Mark that `balance_content()` has run.
    pub fn mark_balanced(&mut self) {
        self.balanced = true;
    }

    /// Mark that `reduce_duplicates()` has run.
    pub fn mark_reduced(&mut self) {
        self.reduced = true;
    }

    /// Fail unless `balance_content()` has already run.
    pub fn require_balanced(&self, variable: &str) -> Result<()> {
        if !self.balanced {
            return Err(IngestError::access_guard(
                variable,
                "balance_content() must run before reduce_duplicates()",
            ));
        }
        Ok(())
    }

    /// Fail unless both flags are set, per the `reduced_content` access
    /// guard in `spec.md` §3.
    pub fn ensure_finalized(&self, variable: &str) -> Result<()> {
        if !(self.balanced && self.reduced) {
            return Err(IngestError::access_guard(
                variable,
                "reduced_content read before balance_content()/reduce_duplicates() completed",
            ));
        }
        Ok(())
    }
}

/// Arithmetic mean over `repeat` observations, per the universal
/// reduction rule in `spec.md` §3.
pub fn mean_over_repeat(observations: &[f64], repeat: usize) -> f64 {
    if repeat == 0 {
        return 0.0;
    }
    observations.iter().sum::<f64>() / repeat as f64
}

/// Pad `content` with zeroes up to `repeat`, or fail if it already holds
/// more than `repeat` observations.
pub fn pad_or_reject(content: &mut Vec<f64>, repeat: usize, variable: &str) -> Result<()> {
    if content.len() > repeat {
        return Err(IngestError::content_invariant(
            variable,
            format!(
                "observation count {} exceeds configured repeat {}",
                content.len(),
                repeat
            ),
        ));
    }
    content.resize(repeat, 0.0);
    Ok(())
}
