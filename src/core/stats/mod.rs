//! The Stat Type Model (`spec.md` §3, §4.1) and its Type Registry & Mapper
//! (§4.2).

pub mod base;
pub mod configuration;
pub mod distribution;
pub mod histogram;
pub mod registry;
pub mod scalar;
pub mod vector;

pub use base::{ReducedContent, Stat, StatValue};
pub use configuration::Configuration;
pub use distribution::Distribution;
pub use histogram::Histogram;
pub use registry::construct_stat;
pub use scalar::Scalar;
pub use vector::Vector;

use serde::{Deserialize, Serialize};

/// The tag identifying which of the five Stat variants a request or
/// scanned variable refers to. Doubles as the tokenizer/scanner wire
/// kind-tag (case-insensitively) per `spec.md` §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKindTag {
    /// Single-valued statistic.
    Scalar,
    /// Multi-entry statistic with a fixed declared entry set.
    Vector,
    /// Range-bucketed statistic with mandatory sentinels.
    Distribution,
    /// Dynamic-bucket statistic, optionally rebinned.
    Histogram,
    /// Single string-valued statistic.
    Configuration,
}

impl StatKindTag {
    /// Parse a tokenizer/scanner wire kind-tag (case-insensitive),
    /// including the `summary` alias which routes to `Scalar`.
    pub fn from_wire_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "scalar" | "summary" => Some(Self::Scalar),
            "vector" => Some(Self::Vector),
            "distribution" => Some(Self::Distribution),
            "histogram" => Some(Self::Histogram),
            "configuration" => Some(Self::Configuration),
            _ => None,
        }
    }

    /// Whether `self` and `other` are substitutable on the wire, per the
    /// Line Parser's reconciliation rule in `spec.md` §4.3: `histogram`
    /// and `vector` are mutually substitutable, and `vector` may be
    /// promoted to `distribution` or `histogram`.
    pub fn reconcilable_with(self, requested: StatKindTag) -> bool {
        if self == requested {
            return true;
        }
        matches!(
            (self, requested),
            (Self::Vector, Self::Histogram)
                | (Self::Histogram, Self::Vector)
                | (Self::Vector, Self::Distribution)
        )
    }
}
