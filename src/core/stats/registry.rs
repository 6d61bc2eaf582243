//! Type Registry & Mapper (`spec.md` §4.2).
//!
//! A process-wide, immutable-after-init map from kind tag to constructor,
//! built once behind a `once_cell::sync::Lazy` the way the teacher's
//! `core/interning.rs` builds its process-wide interner. Population is an
//! explicit function (`register_builtin_kinds`) called from inside the
//! `Lazy` initializer rather than relying on decorator-style self
//! registration at import time (`spec.md` §9).

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::core::errors::{IngestError, Result};
use crate::core::model::StatRequest;
use crate::core::stats::{Configuration, Distribution, Histogram, Scalar, Stat, StatKindTag, Vector};

type StatConstructor = fn(&StatRequest, &str) -> Result<Box<dyn Stat>>;

fn construct_scalar(request: &StatRequest, variable: &str) -> Result<Box<dyn Stat>> {
    Ok(Box::new(Scalar::new(variable, request.effective_repeat())))
}

fn construct_vector(request: &StatRequest, variable: &str) -> Result<Box<dyn Stat>> {
    let entries = request.params.entries.clone().ok_or_else(|| {
        IngestError::construction_field("Vector requires declared entries", "entries")
    })?;
    Ok(Box::new(Vector::new(variable, request.effective_repeat(), entries)))
}

fn construct_distribution(request: &StatRequest, variable: &str) -> Result<Box<dyn Stat>> {
    let minimum = request
        .params
        .minimum
        .ok_or_else(|| IngestError::construction_field("Distribution requires minimum", "minimum"))?;
    let maximum = request
        .params
        .maximum
        .ok_or_else(|| IngestError::construction_field("Distribution requires maximum", "maximum"))?;
    let extra_statistics = request.params.extra_statistics.clone().unwrap_or_default();
    Ok(Box::new(Distribution::new(
        variable,
        request.effective_repeat(),
        minimum,
        maximum,
        extra_statistics,
        request.statistics_only,
    )?))
}

fn construct_histogram(request: &StatRequest, variable: &str) -> Result<Box<dyn Stat>> {
    Ok(Box::new(Histogram::new(
        variable,
        request.effective_repeat(),
        request.params.bins,
        request.params.max_range,
    )))
}

fn construct_configuration(request: &StatRequest, variable: &str) -> Result<Box<dyn Stat>> {
    let on_empty = request.params.on_empty.clone().unwrap_or_default();
    Ok(Box::new(Configuration::new(
        variable,
        request.effective_repeat(),
        on_empty,
    )))
}

fn register_builtin_kinds(map: &mut HashMap<StatKindTag, StatConstructor>) {
    map.insert(StatKindTag::Scalar, construct_scalar);
    map.insert(StatKindTag::Vector, construct_vector);
    map.insert(StatKindTag::Distribution, construct_distribution);
    map.insert(StatKindTag::Histogram, construct_histogram);
    map.insert(StatKindTag::Configuration, construct_configuration);
}

static REGISTRY: Lazy<HashMap<StatKindTag, StatConstructor>> = Lazy::new(|| {
    let mut map = HashMap::new();
    register_builtin_kinds(&mut map);
    map
});

/// Translate a [`StatRequest`] into a freshly constructed Stat instance
/// bound to a concrete `variable` name (the request's own name for a
/// concrete request, or one of its `parsed_ids` aliases).
pub fn construct_stat(request: &StatRequest, variable: &str) -> Result<Box<dyn Stat>> {
    let constructor = REGISTRY.get(&request.kind).ok_or_else(|| {
        IngestError::construction(format!("no constructor registered for kind {:?}", request.kind))
    })?;
    constructor(request, variable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::StatParams;

    #[test]
    fn test_construct_scalar_uses_effective_repeat() {
        let req = StatRequest {
            name: "simTicks".into(),
            kind: StatKindTag::Scalar,
            repeat: 1,
            params: StatParams {
                parsed_ids: Some(vec!["a".into(), "b".into()]),
                ..Default::default()
            },
            statistics_only: false,
            is_regex: false,
        };
        let stat = construct_stat(&req, "simTicks").unwrap();
        assert_eq!(stat.repeat(), 2);
    }

    #[test]
    fn test_construct_vector_requires_entries() {
        let req = StatRequest::concrete("v", StatKindTag::Vector, 1);
        assert!(construct_stat(&req, "v").is_err());
    }

    #[test]
    fn test_construct_distribution_threads_statistics_only_into_entries() {
        let mut req = StatRequest::concrete("d", StatKindTag::Distribution, 1);
        req.params.minimum = Some(0);
        req.params.maximum = Some(2);
        req.params.extra_statistics = Some(vec!["mean".into()]);
        req.statistics_only = true;
        let stat = construct_stat(&req, "d").unwrap();
        assert_eq!(stat.entries().unwrap(), vec!["mean".to_string()]);
    }
}
