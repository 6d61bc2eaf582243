//! Scalar stat kind: a single ordered list of numeric observations.

use crate::core::errors::{IngestError, Result};
use crate::core::stats::base::{mean_over_repeat, pad_or_reject, BalanceGuard, ReducedContent, Stat, StatValue};
use crate::core::stats::StatKindTag;

/// A single-valued statistic observed `repeat` times per file.
#[derive(Debug)]
pub struct Scalar {
    variable: String,
    repeat: usize,
    content: Vec<f64>,
    guard: BalanceGuard,
    reduced: Option<f64>,
}

impl Scalar {
    /// Construct a new Scalar accumulator.
    pub fn new(variable: impl Into<String>, repeat: usize) -> Self {
        Self {
            variable: variable.into(),
            repeat,
            content: Vec::new(),
            guard: BalanceGuard::default(),
            reduced: None,
        }
    }
}

impl Stat for Scalar {
    fn set_content(&mut self, value: StatValue) -> Result<()> {
        match value {
            StatValue::Numeric(v) => {
                self.content.push(v);
                Ok(())
            }
            _ => Err(IngestError::content_invariant(
                &self.variable,
                "Scalar requires a numeric observation",
            )),
        }
    }

    fn balance_content(&mut self) -> Result<()> {
        pad_or_reject(&mut self.content, self.repeat, &self.variable)?;
        self.guard.mark_balanced();
        Ok(())
    }

    fn reduce_duplicates(&mut self) -> Result<()> {
        self.guard.require_balanced(&self.variable)?;
        self.reduced = Some(mean_over_repeat(&self.content, self.repeat));
        self.guard.mark_reduced();
        Ok(())
    }

    fn entries(&self) -> Option<Vec<String>> {
        None
    }

    fn reduced_content(&self) -> Result<ReducedContent> {
        self.guard.ensure_finalized(&self.variable)?;
        Ok(ReducedContent::Scalar(self.reduced.expect(
            "reduced value must be populated once ensure_finalized succeeds",
        )))
    }

    fn repeat(&self) -> usize {
        self.repeat
    }

    fn variable_name(&self) -> &str {
        &self.variable
    }

    fn kind_tag(&self) -> StatKindTag {
        StatKindTag::Scalar
    }
}
