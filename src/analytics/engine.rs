//! Analysis orchestration: fetch a target's history, run the calculators, assemble reports

use crate::analytics::alerts::{pattern_alerts, spec_violation};
use crate::analytics::capability::ProcessCapability;
use crate::analytics::control_limits::{ControlLimits, DEFAULT_SIGMA_LEVEL};
use crate::analytics::distribution::{SeriesDistribution, SpecConformance, DEFAULT_NORMALITY_ALPHA};
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::reports::{
    DistributionAnalysis, DistributionReport, ProcessStatisticsReport, SeriesData, SpcAnalysis,
    SpcReport,
};
use crate::analytics::rules::{NelsonDetector, MIN_NELSON_SAMPLES};
use crate::analytics::spec_check::SpecStatus;
use crate::analytics::statistics::BasicStatistics;
use crate::error::{AppError, Result};
use crate::models::{AlertCandidate, Measurement, PositionMap, SpecLimits, TargetId};
use crate::state::{MeasurementStore, SpecStore, TimeRange};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Configuration for the analytics engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Control limit width in standard deviations
    #[serde(default = "default_sigma_level")]
    pub sigma_level: f64,

    /// Default SPC analysis window (days)
    #[serde(default = "default_spc_lookback_days")]
    pub spc_lookback_days: i64,

    /// Default statistics / capability window (days)
    #[serde(default = "default_statistics_lookback_days")]
    pub statistics_lookback_days: i64,

    /// Minimum sample size before any Nelson rule is evaluated
    #[serde(default = "default_min_nelson_samples")]
    pub min_nelson_samples: usize,

    /// Significance level of the normality test
    #[serde(default = "default_normality_alpha")]
    pub normality_alpha: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            sigma_level: default_sigma_level(),
            spc_lookback_days: default_spc_lookback_days(),
            statistics_lookback_days: default_statistics_lookback_days(),
            min_nelson_samples: default_min_nelson_samples(),
            normality_alpha: default_normality_alpha(),
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if !self.sigma_level.is_finite() || self.sigma_level <= 0.0 {
            return Err(AnalyticsError::InvalidConfiguration(format!(
                "sigma_level must be positive, got {}",
                self.sigma_level
            )));
        }
        if self.spc_lookback_days <= 0 || self.statistics_lookback_days <= 0 {
            return Err(AnalyticsError::InvalidConfiguration(
                "lookback windows must be at least one day".to_string(),
            ));
        }
        if self.min_nelson_samples == 0 {
            return Err(AnalyticsError::InvalidConfiguration(
                "min_nelson_samples must be at least 1".to_string(),
            ));
        }
        if !(self.normality_alpha > 0.0 && self.normality_alpha < 1.0) {
            return Err(AnalyticsError::InvalidConfiguration(format!(
                "normality_alpha must lie in (0, 1), got {}",
                self.normality_alpha
            )));
        }
        Ok(())
    }
}

fn default_sigma_level() -> f64 {
    DEFAULT_SIGMA_LEVEL
}

fn default_spc_lookback_days() -> i64 {
    30
}

fn default_statistics_lookback_days() -> i64 {
    14
}

fn default_min_nelson_samples() -> usize {
    MIN_NELSON_SAMPLES
}

fn default_normality_alpha() -> f64 {
    DEFAULT_NORMALITY_ALPHA
}

/// SPC and capability analysis over the measurement history of a target
///
/// Read-only: the engine never writes to the stores it is given.
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    detector: NelsonDetector,
    measurements: Arc<dyn MeasurementStore>,
    specs: Arc<dyn SpecStore>,
}

impl AnalyticsEngine {
    /// Create a new analytics engine
    pub fn new(
        config: AnalyticsConfig,
        measurements: Arc<dyn MeasurementStore>,
        specs: Arc<dyn SpecStore>,
    ) -> Self {
        Self {
            detector: NelsonDetector::new(config.min_nelson_samples),
            config,
            measurements,
            specs,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(measurements: Arc<dyn MeasurementStore>, specs: Arc<dyn SpecStore>) -> Self {
        Self::new(AnalyticsConfig::default(), measurements, specs)
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// SPC analysis of the last `days` days (configured default when `None`)
    pub async fn analyze_spc(&self, target_id: TargetId, days: Option<i64>) -> Result<SpcReport> {
        let days = days.unwrap_or(self.config.spc_lookback_days);
        let range = TimeRange::since(lookback_start(Utc::now(), days)?);
        self.analyze_spc_range(target_id, &range).await
    }

    /// SPC analysis over an explicit time range
    pub async fn analyze_spc_range(&self, target_id: TargetId, range: &TimeRange) -> Result<SpcReport> {
        let measurements = self.measurements.fetch_measurements(target_id, range).await?;
        if measurements.is_empty() {
            tracing::info!(target_id, "No measurements in SPC window");
            return Ok(SpcReport::empty(target_id));
        }

        let spec = self.specs.fetch_active_spec(target_id).await?;
        let report = self.build_spc_report(target_id, &measurements, spec)?;

        tracing::info!(
            target_id,
            sample_count = report.sample_count,
            findings = report.all_findings().count(),
            spec_found = spec.is_some(),
            "SPC analysis complete"
        );

        Ok(report)
    }

    /// Assemble the SPC report from an already fetched, time-ordered sample
    pub fn build_spc_report(
        &self,
        target_id: TargetId,
        measurements: &[Measurement],
        spec: Option<SpecLimits>,
    ) -> Result<SpcReport> {
        if measurements.is_empty() {
            return Ok(SpcReport::empty(target_id));
        }

        let sigma_level = self.config.sigma_level;
        let values: Vec<f64> = measurements.iter().map(Measurement::avg_value).collect();
        let dates = measurements.iter().map(|m| m.created_at).collect();

        let control_limits = ControlLimits::calculate(&values, sigma_level)?;
        let patterns = self.detector.detect(&values, &control_limits)?;

        let position_data =
            PositionMap::from_fn(|p| measurements.iter().map(|m| m.value(p)).collect::<Vec<f64>>());
        let position_control_limits =
            PositionMap::try_from_fn(|p| ControlLimits::calculate(position_data.get(p), sigma_level))?;
        let position_patterns = PositionMap::try_from_fn(|p| {
            self.detector
                .detect(position_data.get(p), position_control_limits.get(p))
        })?;

        Ok(SpcReport {
            target_id,
            sample_count: measurements.len(),
            analysis: Some(SpcAnalysis {
                data: SeriesData { values, dates },
                control_limits,
                patterns,
                position_data,
                position_control_limits,
                position_patterns,
                spec,
            }),
        })
    }

    /// Statistics and capability of the last `days` days (configured default when `None`)
    pub async fn recent_process_statistics(
        &self,
        target_id: TargetId,
        days: Option<i64>,
    ) -> Result<ProcessStatisticsReport> {
        let days = days.unwrap_or(self.config.statistics_lookback_days);
        let range = TimeRange::since(lookback_start(Utc::now(), days)?);
        self.process_statistics(target_id, &range).await
    }

    /// Statistics and capability over an optional date range
    pub async fn process_statistics(
        &self,
        target_id: TargetId,
        range: &TimeRange,
    ) -> Result<ProcessStatisticsReport> {
        let measurements = self.measurements.fetch_measurements(target_id, range).await?;
        let spec = self.specs.fetch_active_spec(target_id).await?;
        let report = Self::build_statistics_report(target_id, &measurements, spec)?;

        tracing::info!(
            target_id,
            sample_count = report.sample_count,
            spec_found = report.spec.is_some(),
            "Process statistics computed"
        );

        Ok(report)
    }

    /// Assemble the statistics report; capability is omitted without a spec
    pub fn build_statistics_report(
        target_id: TargetId,
        measurements: &[Measurement],
        spec: Option<SpecLimits>,
    ) -> Result<ProcessStatisticsReport> {
        let values: Vec<f64> = measurements.iter().map(Measurement::avg_value).collect();
        let position_values =
            PositionMap::from_fn(|p| measurements.iter().map(|m| m.value(p)).collect::<Vec<f64>>());

        let overall_statistics = BasicStatistics::from_values(&values)?;
        let position_statistics =
            PositionMap::try_from_fn(|p| BasicStatistics::from_values(position_values.get(p)))?;

        let (process_capability, position_capability) = match spec {
            Some(limits) => (
                Some(ProcessCapability::calculate(&values, &limits)?),
                Some(PositionMap::try_from_fn(|p| {
                    ProcessCapability::calculate(position_values.get(p), &limits)
                })?),
            ),
            None => (None, None),
        };

        Ok(ProcessStatisticsReport {
            target_id,
            sample_count: measurements.len(),
            overall_statistics,
            position_statistics,
            spec: spec.map(|limits| limits.summary()),
            process_capability,
            position_capability,
        })
    }

    /// Distribution analysis of the last `days` days (SPC window when `None`)
    pub async fn analyze_distribution(&self, target_id: TargetId, days: Option<i64>) -> Result<DistributionReport> {
        let days = days.unwrap_or(self.config.spc_lookback_days);
        let range = TimeRange::since(lookback_start(Utc::now(), days)?);

        let measurements = self.measurements.fetch_measurements(target_id, &range).await?;
        if measurements.is_empty() {
            tracing::info!(target_id, "No measurements in distribution window");
            return Ok(DistributionReport::empty(target_id));
        }

        let spec = self.specs.fetch_active_spec(target_id).await?;
        let report = self.build_distribution_report(target_id, &measurements, spec)?;

        tracing::info!(
            target_id,
            sample_count = report.sample_count,
            spec_found = spec.is_some(),
            "Distribution analysis complete"
        );

        Ok(report)
    }

    /// Assemble the distribution report from an already fetched sample
    pub fn build_distribution_report(
        &self,
        target_id: TargetId,
        measurements: &[Measurement],
        spec: Option<SpecLimits>,
    ) -> Result<DistributionReport> {
        if measurements.is_empty() {
            return Ok(DistributionReport::empty(target_id));
        }

        let alpha = self.config.normality_alpha;
        let values: Vec<f64> = measurements.iter().map(Measurement::avg_value).collect();
        let overall = SeriesDistribution::from_values(&values, alpha)?;

        let position_analysis = PositionMap::try_from_fn(|p| {
            let series: Vec<f64> = measurements.iter().map(|m| m.value(p)).collect();
            SeriesDistribution::from_values(&series, alpha)
        })?;
        let conformance = spec.and_then(|limits| SpecConformance::evaluate(&values, &limits));

        Ok(DistributionReport {
            target_id,
            sample_count: measurements.len(),
            analysis: Some(DistributionAnalysis {
                values,
                histogram: overall.histogram,
                normal_pdf: overall.normal_pdf,
                distribution_stats: overall.stats,
                spec: conformance,
                position_analysis,
            }),
        })
    }

    /// Spec conformance of one stored measurement against its target's active spec
    pub async fn spec_status(&self, measurement_id: &Uuid) -> Result<SpecStatus> {
        let measurement = self
            .measurements
            .get_measurement(measurement_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Measurement {} not found", measurement_id)))?;

        let spec = self.specs.fetch_active_spec(measurement.target_id).await?;
        Ok(SpecStatus::evaluate(&measurement, spec.as_ref()))
    }

    /// Alerts the caller should persist for the SPC window of a target:
    /// one per aggregate pattern finding, then one per out-of-spec measurement
    pub async fn alert_candidates(&self, target_id: TargetId, days: Option<i64>) -> Result<Vec<AlertCandidate>> {
        let days = days.unwrap_or(self.config.spc_lookback_days);
        let range = TimeRange::since(lookback_start(Utc::now(), days)?);

        let measurements = self.measurements.fetch_measurements(target_id, &range).await?;
        if measurements.is_empty() {
            return Ok(Vec::new());
        }

        let spec = self.specs.fetch_active_spec(target_id).await?;
        let report = self.build_spc_report(target_id, &measurements, spec)?;

        let mut candidates = match &report.analysis {
            Some(analysis) => pattern_alerts(&measurements, &analysis.patterns),
            None => Vec::new(),
        };
        if let Some(limits) = spec {
            candidates.extend(measurements.iter().filter_map(|m| spec_violation(m, &limits)));
        }

        tracing::debug!(target_id, candidates = candidates.len(), "Alert candidates derived");
        Ok(candidates)
    }
}

/// Start of a lookback window ending at `now`
pub fn lookback_start(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    if days < 0 {
        return Err(AppError::Validation(format!(
            "lookback must not be negative, got {} days",
            days
        )));
    }

    Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| AppError::Validation(format!("lookback of {} days is out of range", days)))
}
