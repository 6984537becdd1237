pub mod store;
pub mod factory;
pub mod snapshot;

pub use store::*;
pub use factory::{create_store, create_in_memory_store};
pub use snapshot::{load_snapshot, Snapshot};

use crate::error::Result;
use crate::models::{AlertStatus, Measurement, Spec, SpcAlert, SpecLimits, TargetId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Trait for measurement storage operations
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// Save a measurement
    async fn save_measurement(&self, measurement: &Measurement) -> Result<()>;

    /// Get a measurement by ID
    async fn get_measurement(&self, id: &Uuid) -> Result<Option<Measurement>>;

    /// Replace a stored measurement (re-submission)
    async fn update_measurement(&self, measurement: &Measurement) -> Result<()>;

    /// Whether a measurement of the same target, lot and wafer is already stored
    async fn is_duplicate_measurement(&self, target_id: TargetId, lot_no: &str, wafer_no: &str) -> Result<bool>;

    /// Measurements of a target within `range`, oldest first
    async fn fetch_measurements(&self, target_id: TargetId, range: &TimeRange) -> Result<Vec<Measurement>>;
}

/// Trait for spec-limit storage operations
///
/// Implementations keep at most one active spec per target. Creating or
/// activating a spec deactivates every other spec of that target in the same
/// atomic step.
#[async_trait]
pub trait SpecStore: Send + Sync {
    /// Store a new spec and make it the active one for its target
    async fn create_spec(&self, spec: Spec) -> Result<Spec>;

    /// Make an existing spec the active one for its target
    async fn activate_spec(&self, id: &Uuid) -> Result<Spec>;

    /// Limits of the active spec of a target, if any
    async fn fetch_active_spec(&self, target_id: TargetId) -> Result<Option<SpecLimits>>;

    /// All spec versions of a target, oldest first
    async fn list_specs(&self, target_id: TargetId) -> Result<Vec<Spec>>;
}

/// Trait for SPC alert storage operations
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Persist a new alert in status `new`
    async fn persist_alert(&self, measurement_id: &Uuid, rule_id: u8, description: &str) -> Result<SpcAlert>;

    /// Apply a review action to an alert
    async fn update_alert_status(&self, id: &Uuid, status: AlertStatus) -> Result<SpcAlert>;

    /// List alerts matching the filter, newest first
    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<SpcAlert>>;
}

/// Inclusive time window; open ends are unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn between(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at <= end)
    }
}

/// Filter for querying alerts
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub statuses: Vec<AlertStatus>,
    pub target_id: Option<TargetId>,
    pub created: TimeRange,
}
