//! Shewhart control limits and the sigma zones derived from them

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::statistics::{ensure_finite, mean, round3, sample_std_dev};
use serde::{Deserialize, Serialize};

/// Conventional ±3σ limits
pub const DEFAULT_SIGMA_LEVEL: f64 = 3.0;

/// Center line and control limits; all `None` below two points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlLimits {
    pub cl: Option<f64>,
    pub ucl: Option<f64>,
    pub lcl: Option<f64>,
}

impl ControlLimits {
    /// Compute `cl = mean`, `ucl/lcl = cl ± k·σ` from a time-ordered sample
    pub fn calculate(values: &[f64], sigma_level: f64) -> AnalyticsResult<Self> {
        ensure_finite(values)?;
        if !sigma_level.is_finite() || sigma_level <= 0.0 {
            return Err(AnalyticsError::InvalidInput(format!(
                "sigma level must be a positive number, got {}",
                sigma_level
            )));
        }

        let (Some(cl), Some(std_dev)) = (mean(values), sample_std_dev(values)) else {
            return Ok(Self::default());
        };

        Ok(Self {
            cl: Some(round3(cl)),
            ucl: Some(round3(cl + sigma_level * std_dev)),
            lcl: Some(round3(cl - sigma_level * std_dev)),
        })
    }

    /// Known limits, e.g. from a frozen control chart
    pub fn fixed(cl: f64, ucl: f64, lcl: f64) -> Self {
        Self {
            cl: Some(cl),
            ucl: Some(ucl),
            lcl: Some(lcl),
        }
    }

    pub fn is_computable(&self) -> bool {
        self.zones().is_some()
    }

    /// Zone thresholds, available once all three limits are known
    pub fn zones(&self) -> Option<Zones> {
        match (self.cl, self.ucl, self.lcl) {
            (Some(cl), Some(ucl), Some(lcl)) => Some(Zones::new(cl, ucl, lcl)),
            _ => None,
        }
    }
}

/// Control-chart zones: one σ-equivalent unit is `(upper - center) / 3`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zones {
    pub center: f64,
    pub upper: f64,
    pub lower: f64,
    pub sigma: f64,
}

impl Zones {
    pub fn new(center: f64, upper: f64, lower: f64) -> Self {
        Self {
            center,
            upper,
            lower,
            sigma: (upper - center) / 3.0,
        }
    }

    /// center + 2s
    pub fn zone_a_upper(&self) -> f64 {
        self.center + 2.0 * self.sigma
    }

    /// center - 2s
    pub fn zone_a_lower(&self) -> f64 {
        self.center - 2.0 * self.sigma
    }

    /// center + s
    pub fn zone_b_upper(&self) -> f64 {
        self.center + self.sigma
    }

    /// center - s
    pub fn zone_b_lower(&self) -> f64 {
        self.center - self.sigma
    }
}
