//! Configuration stat kind: a single string value per file, first-observed
//! wins at reduce time.

use crate::core::errors::{IngestError, Result};
use crate::core::stats::base::{BalanceGuard, ReducedContent, Stat, StatValue};
use crate::core::stats::StatKindTag;

/// A string-valued statistic, typically sourced from a run's recorded
/// configuration rather than its statistics stream.
#[derive(Debug)]
pub struct Configuration {
    variable: String,
    repeat: usize,
    content: Vec<String>,
    guard: BalanceGuard,
    on_empty_default: String,
    reduced: Option<String>,
}

impl Configuration {
    /// Construct a new Configuration accumulator.
    pub fn new(variable: impl Into<String>, repeat: usize, on_empty_default: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            repeat,
            content: Vec::new(),
            guard: BalanceGuard::default(),
            on_empty_default: on_empty_default.into(),
            reduced: None,
        }
    }
}

impl Stat for Configuration {
    fn set_content(&mut self, value: StatValue) -> Result<()> {
        match value {
            StatValue::Text(s) => {
                self.content.push(s);
                Ok(())
            }
            StatValue::Numeric(n) => {
                self.content.push(n.to_string());
                Ok(())
            }
            StatValue::Entries(_) => Err(IngestError::content_invariant(
                &self.variable,
                "Configuration does not accept entry-keyed observations",
            )),
        }
    }

    fn balance_content(&mut self) -> Result<()> {
        // Open question in spec.md §9: whether excess observations beyond
        // `repeat` should be a hard error, as they are for Scalar. We keep
        // the original behavior (silently keep the first) documented in
        // DESIGN.md rather than guessing a stricter policy.
        self.guard.mark_balanced();
        Ok(())
    }

    fn reduce_duplicates(&mut self) -> Result<()> {
        self.guard.require_balanced(&self.variable)?;
        self.reduced = Some(
            self.content
                .first()
                .cloned()
                .unwrap_or_else(|| self.on_empty_default.clone()),
        );
        self.guard.mark_reduced();
        Ok(())
    }

    fn entries(&self) -> Option<Vec<String>> {
        None
    }

    fn reduced_content(&self) -> Result<ReducedContent> {
        self.guard.ensure_finalized(&self.variable)?;
        Ok(ReducedContent::Text(
            self.reduced
                .clone()
                .expect("reduced value must be populated once ensure_finalized succeeds"),
        ))
    }

    fn repeat(&self) -> usize {
        self.repeat
    }

    fn variable_name(&self) -> &str {
        &self.variable
    }

    fn kind_tag(&self) -> StatKindTag {
        StatKindTag::Configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_keeps_first_value() {
        let mut c = Configuration::new("isa", 1, "unknown");
        c.set_content(StatValue::Text("riscv".to_string())).unwrap();
        c.set_content(StatValue::Text("arm".to_string())).unwrap();
        c.balance_content().unwrap();
        c.reduce_duplicates().unwrap();
        assert_eq!(
            c.reduced_content().unwrap(),
            ReducedContent::Text("riscv".to_string())
        );
    }

    #[test]
    fn test_configuration_on_empty_default() {
        let mut c = Configuration::new("isa", 1, "unknown");
        c.balance_content().unwrap();
        c.reduce_duplicates().unwrap();
        assert_eq!(
            c.reduced_content().unwrap(),
            ReducedContent::Text("unknown".to_string())
        );
    }
}
