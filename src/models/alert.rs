use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Rule id used for spec-limit violations (Nelson rules use 1..=8)
pub const SPEC_VIOLATION_RULE_ID: u8 = 0;

/// Review status of an SPC alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertStatus {
    New,
    InReview,
    Resolved,
    Exception,
}

impl AlertStatus {
    /// Review actions may move an alert to any other non-`new` status
    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        next != AlertStatus::New && next != *self
    }

    pub fn is_open(&self) -> bool {
        matches!(self, AlertStatus::New | AlertStatus::InReview)
    }
}

/// Why an alert should be raised: produced by the engine, persisted by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCandidate {
    /// Implicated measurement
    pub measurement_id: Uuid,

    /// Nelson rule id, or [`SPEC_VIOLATION_RULE_ID`]
    pub rule_id: u8,

    pub description: String,
}

/// A persisted SPC alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpcAlert {
    pub id: Uuid,
    pub measurement_id: Uuid,
    pub rule_id: u8,
    pub status: AlertStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SpcAlert {
    /// Create a new alert in status `new`
    pub fn new(measurement_id: Uuid, rule_id: u8, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            measurement_id,
            rule_id,
            status: AlertStatus::New,
            description,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Apply a review action
    pub fn transition(&mut self, next: AlertStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition(format!(
                "{} -> {}",
                self.status, next
            )));
        }

        self.status = next;
        self.updated_at = Some(Utc::now());
        Ok(())
    }
}

impl From<AlertCandidate> for SpcAlert {
    fn from(candidate: AlertCandidate) -> Self {
        SpcAlert::new(candidate.measurement_id, candidate.rule_id, candidate.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_alert_status() {
        let alert = SpcAlert::new(Uuid::new_v4(), 2, "Nelson Rule 2".to_string());
        assert_eq!(alert.status, AlertStatus::New);
        assert!(alert.status.is_open());
        assert!(alert.updated_at.is_none());
    }

    #[test]
    fn test_review_transitions() {
        let mut alert = SpcAlert::new(Uuid::new_v4(), 1, "Nelson Rule 1".to_string());

        alert.transition(AlertStatus::InReview).unwrap();
        alert.transition(AlertStatus::Exception).unwrap();
        assert_eq!(alert.status, AlertStatus::Exception);
        assert!(!alert.status.is_open());

        assert!(alert.transition(AlertStatus::New).is_err());
        assert!(alert.transition(AlertStatus::Exception).is_err());
    }

    #[test]
    fn test_status_string_forms() {
        assert_eq!(AlertStatus::InReview.to_string(), "in_review");
        assert_eq!(AlertStatus::from_str("exception").unwrap(), AlertStatus::Exception);
        assert_eq!(
            serde_json::to_string(&AlertStatus::Resolved).unwrap(),
            "\"resolved\""
        );
    }
}
