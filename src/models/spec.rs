use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::TargetId;
use crate::analytics::round3;
use crate::error::{AppError, Result};

/// Engineering tolerance band for one target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecLimits {
    pub lsl: f64,
    pub usl: f64,
}

impl SpecLimits {
    /// Validated constructor: both limits finite and `lsl < usl`
    pub fn new(lsl: f64, usl: f64) -> Result<Self> {
        if !lsl.is_finite() || !usl.is_finite() {
            return Err(AppError::Validation(format!(
                "Spec limits must be finite (lsl={}, usl={})",
                lsl, usl
            )));
        }
        if lsl >= usl {
            return Err(AppError::Validation(format!(
                "LSL must be below USL (lsl={}, usl={})",
                lsl, usl
            )));
        }
        Ok(Self { lsl, usl })
    }

    /// Nominal target value: the midpoint of the band
    pub fn midpoint(&self) -> f64 {
        round3((self.lsl + self.usl) / 2.0)
    }

    /// Inclusive band check
    pub fn contains(&self, value: f64) -> bool {
        self.lsl <= value && value <= self.usl
    }

    pub fn summary(&self) -> SpecSummary {
        SpecSummary {
            lsl: self.lsl,
            usl: self.usl,
            target: self.midpoint(),
        }
    }
}

/// Spec limits with their midpoint, as reported by the capability report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecSummary {
    pub lsl: f64,
    pub usl: f64,
    pub target: f64,
}

/// Spec creation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSpec {
    pub target_id: TargetId,
    pub lsl: f64,
    pub usl: f64,

    /// Why the limits were (re)defined
    #[validate(length(max = 500))]
    #[serde(default)]
    pub reason: Option<String>,
}

/// A stored spec version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub id: Uuid,
    pub target_id: TargetId,
    pub limits: SpecLimits,
    pub reason: Option<String>,

    /// At most one spec per target is active
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

impl Spec {
    /// Build a new, active spec version from a request
    pub fn from_request(request: NewSpec) -> Result<Self> {
        request.validate()?;
        let limits = SpecLimits::new(request.lsl, request.usl)?;

        Ok(Self {
            id: Uuid::new_v4(),
            target_id: request.target_id,
            limits,
            reason: request.reason,
            is_active: true,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_validation() {
        assert!(SpecLimits::new(0.0, 12.0).is_ok());
        assert!(SpecLimits::new(12.0, 12.0).is_err());
        assert!(SpecLimits::new(13.0, 12.0).is_err());
        assert!(SpecLimits::new(f64::NAN, 12.0).is_err());
    }

    #[test]
    fn test_midpoint_and_contains() {
        let limits = SpecLimits::new(9.5, 10.5).unwrap();
        assert_eq!(limits.midpoint(), 10.0);
        assert!(limits.contains(9.5));
        assert!(limits.contains(10.5));
        assert!(!limits.contains(10.501));
    }

    #[test]
    fn test_spec_from_request_is_active() {
        let spec = Spec::from_request(NewSpec {
            target_id: 3,
            lsl: 1.0,
            usl: 2.0,
            reason: Some("initial qualification".to_string()),
        })
        .unwrap();
        assert!(spec.is_active);
        assert_eq!(spec.limits.usl, 2.0);
    }
}
