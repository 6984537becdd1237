//! Per-position spec conformance of a single measurement

use crate::models::{Measurement, PositionMap, SpecLimits};
use serde::Serialize;

/// One reading and whether it lies inside the spec band
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionCheck {
    pub value: f64,
    pub in_spec: bool,
}

/// Spec status of a measurement; only `spec_found` when no spec is active
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecStatus {
    pub spec_found: bool,

    #[serde(flatten)]
    pub detail: Option<SpecStatusDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecStatusDetail {
    pub lsl: f64,
    pub usl: f64,
    pub values: PositionMap<PositionCheck>,
    pub avg: PositionCheck,
    pub all_in_spec: bool,
}

impl SpecStatus {
    pub fn evaluate(measurement: &Measurement, spec: Option<&SpecLimits>) -> Self {
        let Some(spec) = spec else {
            return Self {
                spec_found: false,
                detail: None,
            };
        };

        let check = |value: f64| PositionCheck {
            value,
            in_spec: spec.contains(value),
        };
        let values = measurement.values.map(|&v| check(v));
        let all_in_spec = values.iter().all(|(_, c)| c.in_spec);

        Self {
            spec_found: true,
            detail: Some(SpecStatusDetail {
                lsl: spec.lsl,
                usl: spec.usl,
                values,
                avg: check(measurement.avg_value()),
                all_in_spec,
            }),
        }
    }

    pub fn all_in_spec(&self) -> bool {
        self.detail.as_ref().map_or(true, |d| d.all_in_spec)
    }
}
