//! Distribution analysis: histogram, shape statistics and a normality test

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::statistics::{ensure_finite, mean, round3, sample_std_dev};
use crate::models::SpecLimits;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF, Normal};
use std::cmp::Ordering;

/// Significance level below which a sample is reported as non-normal
pub const DEFAULT_NORMALITY_ALPHA: f64 = 0.05;

/// Smallest sample the D'Agostino-Pearson test is defined for
pub const MIN_NORMALITY_SAMPLES: usize = 8;

/// Points on a fitted normal curve
const CURVE_POINTS: usize = 100;

/// Fitted curves span mean ± this many standard deviations
const CURVE_HALF_WIDTH: f64 = 4.0;

/// Number of histogram bins for `n` points (Sturges' rule)
pub fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (n as f64).log2().ceil() as usize + 1
}

/// Median, `None` for an empty slice
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Standardized third and fourth central moments `(g1, b2)`
///
/// Population (biased) moments; `None` for an empty or zero-spread sample.
fn standardized_moments(values: &[f64]) -> Option<(f64, f64)> {
    let mean = mean(values)?;
    let scale = values.iter().map(|v| (v - mean).abs()).fold(0.0, f64::max);
    if scale == 0.0 {
        return None;
    }

    let n = values.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = (v - mean) / scale;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);

    Some((m3 / m2.powf(1.5), m4 / (m2 * m2)))
}

/// Sample skewness g1; `None` below 3 points or with zero spread
pub fn skewness(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    standardized_moments(values).map(|(g1, _)| g1)
}

/// Excess kurtosis g2 (0 for a normal distribution); `None` below 4 points or with zero spread
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    if values.len() < 4 {
        return None;
    }
    standardized_moments(values).map(|(_, b2)| b2 - 3.0)
}

/// Equal-width histogram between the sample minimum and maximum
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin centers
    pub bins: Vec<f64>,

    /// Bin boundaries, one more than `bins`
    pub edges: Vec<f64>,

    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn from_values(values: &[f64]) -> AnalyticsResult<Self> {
        ensure_finite(values)?;
        if values.is_empty() {
            return Ok(Self::default());
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if min == max {
            return Ok(Self {
                bins: vec![round3(min)],
                edges: vec![round3(min), round3(max)],
                counts: vec![values.len()],
            });
        }

        let bin_count = sturges_bins(values.len());
        let width = (max - min) / bin_count as f64;

        let mut counts = vec![0; bin_count];
        for &value in values {
            // The last bin is closed on the right
            let index = (((value - min) / width).floor() as usize).min(bin_count - 1);
            counts[index] += 1;
        }

        Ok(Self {
            bins: (0..bin_count)
                .map(|i| round3(min + width * (i as f64 + 0.5)))
                .collect(),
            edges: (0..=bin_count).map(|i| round3(min + width * i as f64)).collect(),
            counts,
        })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Normal density fitted to a sample, sampled over mean ± 4σ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl NormalCurve {
    /// `None` unless `std_dev` is a positive finite number
    pub fn fit(mean: f64, std_dev: f64) -> Option<Self> {
        if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0.0 {
            return None;
        }
        let normal = Normal::new(mean, std_dev).ok()?;

        let start = mean - CURVE_HALF_WIDTH * std_dev;
        let step = 2.0 * CURVE_HALF_WIDTH * std_dev / (CURVE_POINTS - 1) as f64;
        let x: Vec<f64> = (0..CURVE_POINTS).map(|i| start + step * i as f64).collect();
        let y = x.iter().map(|&x| normal.pdf(x)).collect();

        Some(Self { x, y })
    }
}

/// D'Agostino-Pearson omnibus test of normality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalityTest {
    /// K² statistic, combining the skewness and kurtosis z-scores
    pub statistic: f64,
    pub p_value: f64,
    pub is_normal: bool,
}

impl NormalityTest {
    /// `None` below [`MIN_NORMALITY_SAMPLES`] points or with zero spread
    pub fn dagostino_pearson(values: &[f64], alpha: f64) -> AnalyticsResult<Option<Self>> {
        ensure_finite(values)?;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(AnalyticsError::InvalidInput(format!(
                "significance level must lie in (0, 1), got {}",
                alpha
            )));
        }
        if values.len() < MIN_NORMALITY_SAMPLES {
            return Ok(None);
        }
        let Some((g1, b2)) = standardized_moments(values) else {
            return Ok(None);
        };

        let n = values.len() as f64;
        let z_skew = skewness_z(g1, n);
        let z_kurt = kurtosis_z(b2, n);
        let statistic = z_skew * z_skew + z_kurt * z_kurt;
        if !statistic.is_finite() {
            return Ok(None);
        }

        let chi_squared =
            ChiSquared::new(2.0).map_err(|e| AnalyticsError::InvalidInput(e.to_string()))?;
        let p_value = (1.0 - chi_squared.cdf(statistic)).clamp(0.0, 1.0);

        Ok(Some(Self {
            statistic: round3(statistic),
            p_value,
            is_normal: p_value > alpha,
        }))
    }
}

/// z-score of the sample skewness (D'Agostino 1970)
fn skewness_z(g1: f64, n: f64) -> f64 {
    let y = g1 * (((n + 1.0) * (n + 3.0)) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();

    delta * (y / alpha).asinh()
}

/// z-score of the sample kurtosis (Anscombe & Glynn 1983)
fn kurtosis_z(b2: f64, n: f64) -> f64 {
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance = 24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / variance.sqrt();

    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * ((6.0 * (n + 3.0) * (n + 5.0)) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0 + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / sqrt_beta1.powi(2)).sqrt());

    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();

    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}

/// Location, spread and shape of a sample; all `None` for an empty sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DistributionStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub skewness: Option<f64>,

    /// Excess kurtosis
    pub kurtosis: Option<f64>,

    pub normality_test: Option<NormalityTest>,
}

impl DistributionStats {
    pub fn from_values(values: &[f64], alpha: f64) -> AnalyticsResult<Self> {
        ensure_finite(values)?;
        let normality_test = NormalityTest::dagostino_pearson(values, alpha)?;

        let Some(mean) = mean(values) else {
            return Ok(Self::default());
        };

        Ok(Self {
            mean: Some(round3(mean)),
            median: median(values).map(round3),
            std_dev: Some(round3(sample_std_dev(values).unwrap_or(0.0))),
            skewness: skewness(values).map(round3),
            kurtosis: excess_kurtosis(values).map(round3),
            normality_test,
        })
    }
}

/// Share of a sample inside the spec band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecConformance {
    pub lsl: f64,
    pub usl: f64,
    pub in_spec_count: usize,

    /// Exact fraction `in_spec_count / n`
    pub in_spec_ratio: f64,
    pub in_spec_percent: f64,
}

impl SpecConformance {
    /// `None` for an empty sample
    pub fn evaluate(values: &[f64], spec: &SpecLimits) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let in_spec_count = values.iter().filter(|&&v| spec.contains(v)).count();
        let in_spec_ratio = in_spec_count as f64 / values.len() as f64;

        Some(Self {
            lsl: spec.lsl,
            usl: spec.usl,
            in_spec_count,
            in_spec_ratio,
            in_spec_percent: round3(in_spec_ratio * 100.0),
        })
    }
}

/// Histogram, fitted curve and shape statistics of one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDistribution {
    pub histogram: Histogram,
    pub normal_pdf: Option<NormalCurve>,
    pub stats: DistributionStats,
}

impl SeriesDistribution {
    pub fn from_values(values: &[f64], alpha: f64) -> AnalyticsResult<Self> {
        let stats = DistributionStats::from_values(values, alpha)?;
        let normal_pdf = match (mean(values), sample_std_dev(values)) {
            (Some(mean), Some(std_dev)) => NormalCurve::fit(mean, std_dev),
            _ => None,
        };

        Ok(Self {
            histogram: Histogram::from_values(values)?,
            normal_pdf,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Expected normal order statistics (Blom) for `n` points
    fn normal_scores(n: usize) -> Vec<f64> {
        let normal = Normal::new(10.0, 0.5).unwrap();
        (1..=n)
            .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
            .collect()
    }

    #[test]
    fn test_sturges_bins() {
        assert_eq!(sturges_bins(0), 1);
        assert_eq!(sturges_bins(1), 1);
        assert_eq!(sturges_bins(2), 2);
        assert_eq!(sturges_bins(8), 4);
        assert_eq!(sturges_bins(10), 5);
        assert_eq!(sturges_bins(100), 8);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_skewness() {
        assert!(close(skewness(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), 0.0));

        // deviations -3, -2, -1, 0, 6: m2 = 10, m3 = 36
        let g1 = skewness(&[1.0, 2.0, 3.0, 4.0, 10.0]).unwrap();
        assert!(close(g1, 36.0 / 10f64.powf(1.5)));

        assert_eq!(skewness(&[1.0, 2.0]), None);
        assert_eq!(skewness(&[5.0; 6]), None);
    }

    #[test]
    fn test_excess_kurtosis() {
        // m2 = 2, m4 = 6.8: b2 = 1.7
        let g2 = excess_kurtosis(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!(close(g2, -1.3));

        // m2 = 10, m4 = 278.8
        let g2 = excess_kurtosis(&[1.0, 2.0, 3.0, 4.0, 10.0]).unwrap();
        assert!(close(g2, 2.788 - 3.0));

        assert_eq!(excess_kurtosis(&[1.0, 2.0, 3.0]), None);
        assert_eq!(excess_kurtosis(&[5.0; 6]), None);
    }

    #[test]
    fn test_histogram() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0];
        let hist = Histogram::from_values(&values).unwrap();

        // 10 points: 5 bins of width 2
        assert_eq!(hist.edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(hist.bins, vec![1.0, 3.0, 5.0, 7.0, 9.0]);
        assert_eq!(hist.counts, vec![2, 2, 2, 2, 2]);
        assert_eq!(hist.total(), values.len());
    }

    #[test]
    fn test_histogram_degenerate_samples() {
        assert_eq!(Histogram::from_values(&[]).unwrap(), Histogram::default());

        let hist = Histogram::from_values(&[4.2; 5]).unwrap();
        assert_eq!(hist.bins, vec![4.2]);
        assert_eq!(hist.counts, vec![5]);

        assert!(Histogram::from_values(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_normal_curve() {
        let curve = NormalCurve::fit(10.0, 2.0).unwrap();
        assert_eq!(curve.x.len(), 100);
        assert_eq!(curve.y.len(), 100);
        assert!(close(curve.x[0], 2.0));
        assert!(close(curve.x[99], 18.0));
        assert!(close(curve.y[0], curve.y[99]));

        let peak = 1.0 / (2.0 * (2.0 * std::f64::consts::PI).sqrt());
        assert!(curve.y.iter().all(|&y| y > 0.0 && y <= peak));

        assert!(NormalCurve::fit(10.0, 0.0).is_none());
    }

    #[test]
    fn test_normality_accepts_normal_scores() {
        let test = NormalityTest::dagostino_pearson(&normal_scores(30), DEFAULT_NORMALITY_ALPHA)
            .unwrap()
            .unwrap();

        assert!(test.is_normal);
        assert!(test.p_value > DEFAULT_NORMALITY_ALPHA);
        // chi-squared with two degrees of freedom: p = exp(-K²/2)
        assert!((test.p_value - (-test.statistic / 2.0).exp()).abs() < 1e-3);
    }

    #[test]
    fn test_normality_rejects_skewed_sample() {
        let mut values = vec![0.0; 19];
        values.push(100.0);

        let test = NormalityTest::dagostino_pearson(&values, DEFAULT_NORMALITY_ALPHA)
            .unwrap()
            .unwrap();
        assert!(!test.is_normal);
        assert!(test.p_value < 0.01);
    }

    #[test]
    fn test_normality_not_computable() {
        let short = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert_eq!(NormalityTest::dagostino_pearson(&short, 0.05).unwrap(), None);
        assert_eq!(NormalityTest::dagostino_pearson(&[3.0; 12], 0.05).unwrap(), None);
        assert!(NormalityTest::dagostino_pearson(&short, 1.5).is_err());
    }

    #[test]
    fn test_spec_conformance() {
        let spec = SpecLimits::new(0.0, 10.0).unwrap();
        let conformance = SpecConformance::evaluate(&[1.0, 10.0, 11.0, -0.5], &spec).unwrap();

        assert_eq!(conformance.in_spec_count, 2);
        assert_eq!(conformance.in_spec_ratio, 0.5);
        assert_eq!(conformance.in_spec_percent, 50.0);
        assert!(SpecConformance::evaluate(&[], &spec).is_none());
    }

    #[test]
    fn test_distribution_stats() {
        let stats = DistributionStats::from_values(&[1.0, 2.0, 3.0, 4.0, 10.0], 0.05).unwrap();

        assert_eq!(stats.mean, Some(4.0));
        assert_eq!(stats.median, Some(3.0));
        assert_eq!(stats.std_dev, Some(3.536));
        assert_eq!(stats.skewness, Some(1.138));
        assert_eq!(stats.kurtosis, Some(-0.212));
        assert!(stats.normality_test.is_none());

        assert_eq!(
            DistributionStats::from_values(&[], 0.05).unwrap(),
            DistributionStats::default()
        );
    }

    #[test]
    fn test_series_distribution() {
        let series = SeriesDistribution::from_values(&normal_scores(20), 0.05).unwrap();
        assert_eq!(series.histogram.total(), 20);
        assert!(series.normal_pdf.is_some());
        assert!(series.stats.normality_test.is_some());

        let single = SeriesDistribution::from_values(&[7.0], 0.05).unwrap();
        assert!(single.normal_pdf.is_none());
        assert_eq!(single.stats.std_dev, Some(0.0));
    }
}
