//! Statistical process control and process-capability analysis
//!
//! The calculators ([`BasicStatistics`], [`ControlLimits`], the Nelson rule
//! scans in [`rules`] and [`ProcessCapability`]) are pure functions over
//! time-ordered values, as are the distribution statistics in
//! [`DistributionStats`]. [`AnalyticsEngine`] fetches a target's measurements
//! through the store traits and assembles them into reports.
//!
//! Sample-shape conditions never fail: an empty sample yields `None` fields,
//! a short sample yields no findings, zero spread yields unbounded capability
//! and a missing spec omits the capability section. Only non-finite input is
//! rejected.
//!
//! # Example
//!
//! ```no_run
//! use dicd_spc::analytics::AnalyticsEngine;
//! use dicd_spc::state::create_in_memory_store;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = create_in_memory_store();
//!     let engine = AnalyticsEngine::with_defaults(store.clone(), store);
//!
//!     let report = engine.analyze_spc(1, Some(30)).await?;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!
//!     Ok(())
//! }
//! ```

pub mod alerts;
mod capability;
mod control_limits;
mod distribution;
mod engine;
mod error;
mod reports;
pub mod rules;
mod spec_check;
mod statistics;

pub use capability::{CapabilityIndex, ProcessCapability, UNBOUNDED_MARKER};
pub use control_limits::{ControlLimits, Zones, DEFAULT_SIGMA_LEVEL};
pub use distribution::{
    excess_kurtosis, median, skewness, sturges_bins, DistributionStats, Histogram, NormalCurve,
    NormalityTest, SeriesDistribution, SpecConformance, DEFAULT_NORMALITY_ALPHA,
    MIN_NORMALITY_SAMPLES,
};
pub use engine::{lookback_start, AnalyticsConfig, AnalyticsEngine};
pub use error::{AnalyticsError, AnalyticsResult};
pub use reports::{
    DistributionAnalysis, DistributionReport, ProcessStatisticsReport, SeriesData, SpcAnalysis,
    SpcReport,
};
pub use rules::{detect_nelson_rules, NelsonDetector, NelsonRule, PatternFinding, MIN_NELSON_SAMPLES};
pub use spec_check::{PositionCheck, SpecStatus, SpecStatusDetail};
pub use statistics::{ensure_finite, mean, round3, sample_std_dev, BasicStatistics};
