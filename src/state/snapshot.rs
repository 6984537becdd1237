use crate::error::{AppError, Result};
use crate::models::{Measurement, NewMeasurement, NewSpec, Spec};
use crate::state::{InMemoryStore, MeasurementStore, SpecStore};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Seed data for an in-memory store
///
/// Specs are applied in file order, so the last spec listed for a target
/// ends up active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub measurements: Vec<NewMeasurement>,

    #[serde(default)]
    pub specs: Vec<NewSpec>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate every record and write it into `store`
    ///
    /// A measurement repeating the target, lot and wafer of a stored one is rejected.
    pub async fn apply<S>(self, store: &S) -> Result<()>
    where
        S: MeasurementStore + SpecStore + ?Sized,
    {
        let measurement_count = self.measurements.len();
        let spec_count = self.specs.len();

        for submission in self.measurements {
            if let (Some(lot_no), Some(wafer_no)) = (&submission.lot_no, &submission.wafer_no) {
                if store
                    .is_duplicate_measurement(submission.target_id, lot_no, wafer_no)
                    .await?
                {
                    return Err(AppError::Validation(format!(
                        "Duplicate measurement for target {}: LOT_NO {}, WAFER_NO {}",
                        submission.target_id, lot_no, wafer_no
                    )));
                }
            }

            let measurement = Measurement::from_submission(submission)?;
            store.save_measurement(&measurement).await?;
        }

        for request in self.specs {
            store.create_spec(Spec::from_request(request)?).await?;
        }

        tracing::info!(
            measurements = measurement_count,
            specs = spec_count,
            "Snapshot applied"
        );
        Ok(())
    }
}

/// Read a JSON snapshot file into a fresh in-memory store
pub async fn load_snapshot(path: &Path) -> Result<InMemoryStore> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Configuration(format!("Failed to read snapshot {}: {}", path.display(), e))
    })?;

    let store = InMemoryStore::new();
    Snapshot::from_json(&contents)?.apply(&store).await?;

    tracing::info!(path = %path.display(), "Loaded snapshot");
    Ok(store)
}
