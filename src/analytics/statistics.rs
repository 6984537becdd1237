//! Descriptive statistics over measurement sequences

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

/// Round to the 3 decimals every reported value carries
///
/// Magnitudes of 1e15 and above carry no sub-milli precision and are returned
/// unchanged, so scaling by 1000 can never overflow.
pub fn round3(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= 1e15 {
        return value;
    }
    (value * 1000.0).round() / 1000.0
}

/// Reject sequences containing NaN or infinities
pub fn ensure_finite(values: &[f64]) -> AnalyticsResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(AnalyticsError::InvalidInput(format!(
            "value at index {} is not a finite number ({})",
            index, values[index]
        ))),
        None => Ok(()),
    }
}

/// Arithmetic mean, `None` for an empty slice
///
/// Summed relative to the first element so a constant sequence yields that
/// constant exactly and its deviations are exactly zero.
pub fn mean(values: &[f64]) -> Option<f64> {
    let first = *values.first()?;
    let n = values.len() as f64;
    let shifted: f64 = values.iter().map(|v| v - first).sum();
    let mean = first + shifted / n;
    if mean.is_finite() {
        return Some(mean);
    }

    // Offsets overflowed; fall back to summing pre-divided values
    Some(values.iter().map(|v| v / n).sum())
}

/// Sample standard deviation (n - 1), `None` below 2 points
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let mean = mean(values)?;

    // Deviations are scaled by the largest one so squaring cannot overflow
    let scale = values.iter().map(|v| (v - mean).abs()).fold(0.0, f64::max);
    if scale == 0.0 {
        return Some(0.0);
    }

    let sum_sq = values.iter().map(|v| ((v - mean) / scale).powi(2)).sum::<f64>();
    Some(scale * (sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Mean, spread and extremes of a sample; all `None` for an empty sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BasicStatistics {
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub range: Option<f64>,
}

impl BasicStatistics {
    /// Calculate statistics from a dataset
    pub fn from_values(values: &[f64]) -> AnalyticsResult<Self> {
        ensure_finite(values)?;

        let Some(mean) = mean(values) else {
            return Ok(Self::default());
        };

        // A single reading has no spread
        let std_dev = sample_std_dev(values).unwrap_or(0.0);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            mean: Some(round3(mean)),
            std_dev: Some(round3(std_dev)),
            min: Some(round3(min)),
            max: Some(round3(max)),
            range: Some(round3(max - min)),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_statistics() {
        let stats = BasicStatistics::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert_eq!(stats.mean, Some(3.0));
        assert_eq!(stats.std_dev, Some(1.581));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(5.0));
        assert_eq!(stats.range, Some(4.0));
    }

    #[test]
    fn test_empty_sample_is_not_computable() {
        let stats = BasicStatistics::from_values(&[]).unwrap();
        assert!(stats.is_empty());
        assert_eq!(stats, BasicStatistics::default());
    }

    #[test]
    fn test_single_value_has_zero_spread() {
        let stats = BasicStatistics::from_values(&[42.123_4]).unwrap();
        assert_eq!(stats.mean, Some(42.123));
        assert_eq!(stats.std_dev, Some(0.0));
        assert_eq!(stats.range, Some(0.0));
    }

    #[test]
    fn test_range_and_ordering_invariants() {
        let samples: [&[f64]; 3] = [
            &[10.02, 9.98, 10.11, 9.87, 10.05],
            &[-3.5, 0.25, 7.75],
            &[0.1, 0.2],
        ];

        for values in samples {
            let stats = BasicStatistics::from_values(values).unwrap();
            let (min, max, mean) = (stats.min.unwrap(), stats.max.unwrap(), stats.mean.unwrap());
            assert!((max - min - stats.range.unwrap()).abs() < 1e-9);
            assert!(min <= mean && mean <= max);
        }
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let err = BasicStatistics::from_values(&[1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
        assert!(BasicStatistics::from_values(&[f64::INFINITY]).is_err());
    }

    #[test]
    fn test_constant_mean_is_exact() {
        let values = [0.1; 7];
        assert_eq!(mean(&values), Some(0.1));
        assert_eq!(sample_std_dev(&values), Some(0.0));
    }

    #[test]
    fn test_large_values_stay_finite() {
        let stats = BasicStatistics::from_values(&[1e306, 1e306]).unwrap();
        assert_eq!(stats.mean, Some(1e306));
        assert_eq!(stats.min, Some(1e306));
        assert_eq!(stats.max, Some(1e306));
        assert_eq!(stats.std_dev, Some(0.0));

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["mean"], serde_json::json!(1e306));

        let spread = BasicStatistics::from_values(&[1e306, -1e306]).unwrap();
        assert_eq!(spread.mean, Some(0.0));
        assert!(spread.std_dev.unwrap().is_finite());
        assert!(spread.min.unwrap() <= spread.mean.unwrap());
        assert!(spread.mean.unwrap() <= spread.max.unwrap());
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(1.23449), 1.234);
        assert_eq!(round3(-2.0006), -2.001);
        assert!(round3(f64::INFINITY).is_infinite());
        assert_eq!(round3(1.5e15), 1.5e15);
        assert_eq!(round3(-1e300), -1e300);
    }
}
