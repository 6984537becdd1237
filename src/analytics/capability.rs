//! Process capability indices against engineering spec limits

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::statistics::{ensure_finite, mean, round3, sample_std_dev};
use crate::models::SpecLimits;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Marker written in place of an infinite index
pub const UNBOUNDED_MARKER: &str = "unbounded";

/// A capability index: a finite ratio, or unbounded when the process shows no spread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapabilityIndex {
    Value(f64),
    Unbounded,
}

impl CapabilityIndex {
    /// `numerator / denominator` rounded to 3 decimals; zero spread is unbounded
    fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            CapabilityIndex::Unbounded
        } else {
            CapabilityIndex::Value(round3(numerator / denominator))
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            CapabilityIndex::Value(v) => Some(*v),
            CapabilityIndex::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, CapabilityIndex::Unbounded)
    }

    /// Unbounded compares greater than any finite value
    pub fn min(self, other: Self) -> Self {
        match (self, other) {
            (CapabilityIndex::Value(a), CapabilityIndex::Value(b)) => CapabilityIndex::Value(a.min(b)),
            (CapabilityIndex::Value(a), CapabilityIndex::Unbounded)
            | (CapabilityIndex::Unbounded, CapabilityIndex::Value(a)) => CapabilityIndex::Value(a),
            (CapabilityIndex::Unbounded, CapabilityIndex::Unbounded) => CapabilityIndex::Unbounded,
        }
    }
}

impl fmt::Display for CapabilityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityIndex::Value(v) => write!(f, "{:.3}", v),
            CapabilityIndex::Unbounded => f.write_str(UNBOUNDED_MARKER),
        }
    }
}

impl Serialize for CapabilityIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CapabilityIndex::Value(v) => serializer.serialize_f64(*v),
            CapabilityIndex::Unbounded => serializer.serialize_str(UNBOUNDED_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for CapabilityIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Value(f64),
            Marker(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Value(v) => Ok(CapabilityIndex::Value(v)),
            Repr::Marker(m) if m == UNBOUNDED_MARKER => Ok(CapabilityIndex::Unbounded),
            Repr::Marker(m) => Err(serde::de::Error::custom(format!(
                "expected a number or \"{}\", got \"{}\"",
                UNBOUNDED_MARKER, m
            ))),
        }
    }
}

/// Cp/Cpk family; every field `None` below two points
///
/// Pp and Ppk use the same overall sample deviation as Cp and Cpk, so the
/// long-term indices equal the short-term ones.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessCapability {
    pub cp: Option<CapabilityIndex>,
    pub cpk: Option<CapabilityIndex>,
    pub pp: Option<CapabilityIndex>,
    pub ppk: Option<CapabilityIndex>,
    pub cpu: Option<CapabilityIndex>,
    pub cpl: Option<CapabilityIndex>,
}

impl ProcessCapability {
    /// Calculate capability of a sample against `spec`
    pub fn calculate(values: &[f64], spec: &SpecLimits) -> AnalyticsResult<Self> {
        ensure_finite(values)?;
        if !spec.lsl.is_finite() || !spec.usl.is_finite() {
            return Err(AnalyticsError::InvalidInput(format!(
                "spec limits must be finite (lsl={}, usl={})",
                spec.lsl, spec.usl
            )));
        }

        let (Some(mean), Some(std_dev)) = (mean(values), sample_std_dev(values)) else {
            return Ok(Self::default());
        };

        let cp = CapabilityIndex::ratio(spec.usl - spec.lsl, 6.0 * std_dev);
        let cpu = CapabilityIndex::ratio(spec.usl - mean, 3.0 * std_dev);
        let cpl = CapabilityIndex::ratio(mean - spec.lsl, 3.0 * std_dev);
        let cpk = cpu.min(cpl);

        Ok(Self {
            cp: Some(cp),
            cpk: Some(cpk),
            pp: Some(cp),
            ppk: Some(cpk),
            cpu: Some(cpu),
            cpl: Some(cpl),
        })
    }

    pub fn is_computable(&self) -> bool {
        self.cp.is_some()
    }
}
