use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::position::{Position, PositionMap};
use super::TargetId;
use crate::analytics::BasicStatistics;
use crate::error::Result;

/// A measurement submission: five CD readings for one wafer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewMeasurement {
    /// Measured target
    pub target_id: TargetId,

    /// Readings per die position
    pub values: PositionMap<f64>,

    /// Lot number
    #[validate(length(min = 1, max = 64))]
    #[serde(default)]
    pub lot_no: Option<String>,

    /// Wafer number
    #[validate(length(min = 1, max = 64))]
    #[serde(default)]
    pub wafer_no: Option<String>,

    /// Device name
    #[validate(length(max = 128))]
    #[serde(default)]
    pub device: Option<String>,

    /// Operator who entered the measurement
    #[validate(length(max = 128))]
    #[serde(default)]
    pub author: Option<String>,

    /// Measurement time; defaults to submission time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewMeasurement {
    pub fn new(target_id: TargetId, values: PositionMap<f64>) -> Self {
        Self {
            target_id,
            values,
            lot_no: None,
            wafer_no: None,
            device: None,
            author: None,
            created_at: None,
        }
    }

    pub fn with_lot(mut self, lot_no: impl Into<String>, wafer_no: impl Into<String>) -> Self {
        self.lot_no = Some(lot_no.into());
        self.wafer_no = Some(wafer_no.into());
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Per-measurement summary derived from the five readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSummary {
    pub avg_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub range_value: f64,
    pub std_dev: f64,
}

impl MeasurementSummary {
    /// Derive the summary; fails on non-finite readings
    pub fn compute(values: &PositionMap<f64>) -> Result<Self> {
        let stats = BasicStatistics::from_values(&values.to_vec())?;

        Ok(Self {
            avg_value: stats.mean.unwrap_or_default(),
            min_value: stats.min.unwrap_or_default(),
            max_value: stats.max.unwrap_or_default(),
            range_value: stats.range.unwrap_or_default(),
            std_dev: stats.std_dev.unwrap_or_default(),
        })
    }
}

/// A stored measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Unique identifier
    pub id: Uuid,

    /// Measured target
    pub target_id: TargetId,

    /// Readings per die position
    pub values: PositionMap<f64>,

    /// Derived aggregate, recomputed on every (re)submission
    pub summary: MeasurementSummary,

    pub lot_no: Option<String>,
    pub wafer_no: Option<String>,
    pub device: Option<String>,
    pub author: Option<String>,

    /// Measurement timestamp
    pub created_at: DateTime<Utc>,

    /// Last re-submission timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl Measurement {
    /// Validate a submission and derive its aggregate
    pub fn from_submission(submission: NewMeasurement) -> Result<Self> {
        submission.validate()?;
        let summary = MeasurementSummary::compute(&submission.values)?;

        Ok(Self {
            id: Uuid::new_v4(),
            target_id: submission.target_id,
            values: submission.values,
            summary,
            lot_no: submission.lot_no,
            wafer_no: submission.wafer_no,
            device: submission.device,
            author: submission.author,
            created_at: submission.created_at.unwrap_or_else(Utc::now),
            updated_at: None,
        })
    }

    /// Replace the whole measurement; the aggregate is recomputed before anything changes
    pub fn resubmit(&mut self, submission: NewMeasurement) -> Result<()> {
        submission.validate()?;
        let summary = MeasurementSummary::compute(&submission.values)?;

        self.target_id = submission.target_id;
        self.values = submission.values;
        self.summary = summary;
        self.lot_no = submission.lot_no;
        self.wafer_no = submission.wafer_no;
        self.device = submission.device;
        self.author = submission.author;
        if let Some(created_at) = submission.created_at {
            self.created_at = created_at;
        }
        self.updated_at = Some(Utc::now());

        tracing::debug!(measurement_id = %self.id, avg = self.summary.avg_value, "Measurement resubmitted");
        Ok(())
    }

    /// Aggregate value (mean of the five readings)
    pub fn avg_value(&self) -> f64 {
        self.summary.avg_value
    }

    pub fn value(&self, position: Position) -> f64 {
        *self.values.get(position)
    }

    /// Short human label used in alert descriptions
    pub fn label(&self) -> String {
        match (&self.lot_no, &self.wafer_no) {
            (Some(lot), Some(wafer)) => format!("LOT_NO: {}, WAFER_NO: {}", lot, wafer),
            (Some(lot), None) => format!("LOT_NO: {}", lot),
            _ => format!("measurement {}", self.id),
        }
    }
}
