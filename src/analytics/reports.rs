//! Report structures returned by the analysis orchestrators

use crate::analytics::capability::ProcessCapability;
use crate::analytics::control_limits::ControlLimits;
use crate::analytics::distribution::{
    DistributionStats, Histogram, NormalCurve, SeriesDistribution, SpecConformance,
};
use crate::analytics::rules::PatternFinding;
use crate::analytics::statistics::BasicStatistics;
use crate::models::{PositionMap, SpecLimits, SpecSummary, TargetId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate values with their timestamps, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub values: Vec<f64>,
    pub dates: Vec<DateTime<Utc>>,
}

/// Control-chart analysis of one target
///
/// With no measurements in the window only `target_id` and
/// `sample_count: 0` are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpcReport {
    pub target_id: TargetId,
    pub sample_count: usize,

    #[serde(flatten)]
    pub analysis: Option<SpcAnalysis>,
}

impl SpcReport {
    pub fn empty(target_id: TargetId) -> Self {
        Self {
            target_id,
            sample_count: 0,
            analysis: None,
        }
    }

    /// No measurements were found; callers usually surface this as "not found"
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Aggregate and per-position findings, in report order
    pub fn all_findings(&self) -> impl Iterator<Item = &PatternFinding> {
        self.analysis.iter().flat_map(|analysis| {
            analysis.patterns.iter().chain(
                analysis
                    .position_patterns
                    .iter()
                    .flat_map(|(_, findings)| findings.iter()),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpcAnalysis {
    pub data: SeriesData,
    pub control_limits: ControlLimits,
    pub patterns: Vec<PatternFinding>,
    pub position_data: PositionMap<Vec<f64>>,
    pub position_control_limits: PositionMap<ControlLimits>,
    pub position_patterns: PositionMap<Vec<PatternFinding>>,

    /// Active spec of the target, omitted when none is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<SpecLimits>,
}

/// Descriptive statistics and capability of one target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessStatisticsReport {
    pub target_id: TargetId,
    pub sample_count: usize,
    pub overall_statistics: BasicStatistics,
    pub position_statistics: PositionMap<BasicStatistics>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<SpecSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_capability: Option<ProcessCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_capability: Option<PositionMap<ProcessCapability>>,
}

impl ProcessStatisticsReport {
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

/// Distribution analysis of one target
///
/// Like [`SpcReport`], an empty window carries only `target_id` and
/// `sample_count: 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionReport {
    pub target_id: TargetId,
    pub sample_count: usize,

    #[serde(flatten)]
    pub analysis: Option<DistributionAnalysis>,
}

impl DistributionReport {
    pub fn empty(target_id: TargetId) -> Self {
        Self {
            target_id,
            sample_count: 0,
            analysis: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionAnalysis {
    /// Aggregate values, oldest first
    pub values: Vec<f64>,
    pub histogram: Histogram,
    pub normal_pdf: Option<NormalCurve>,
    pub distribution_stats: DistributionStats,

    /// Conformance of the aggregate values, omitted when no spec is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<SpecConformance>,

    pub position_analysis: PositionMap<SeriesDistribution>,
}
