//! Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::{Duration, Utc};
use dicd_spc::models::{Measurement, NewMeasurement, NewSpec, PositionMap, Spec, TargetId};
use dicd_spc::state::{InMemoryStore, MeasurementStore, SpecStore};
use std::sync::Arc;

/// A measurement whose five readings all equal `value`
pub fn uniform_measurement(target_id: TargetId, value: f64, minutes_ago: i64) -> Measurement {
    Measurement::from_submission(
        NewMeasurement::new(target_id, PositionMap::from_fn(|_| value))
            .with_lot("LOT01", format!("W{:02}", minutes_ago))
            .at(Utc::now() - Duration::minutes(minutes_ago)),
    )
    .unwrap()
}

/// Store `values` as a time series for `target_id`, one minute apart, oldest first
pub async fn seed_series(store: &InMemoryStore, target_id: TargetId, values: &[f64]) -> Vec<Measurement> {
    let n = values.len() as i64;
    let mut stored = Vec::with_capacity(values.len());
    for (i, &value) in values.iter().enumerate() {
        let measurement = uniform_measurement(target_id, value, n - i as i64);
        store.save_measurement(&measurement).await.unwrap();
        stored.push(measurement);
    }
    stored
}

pub async fn seed_spec(store: &InMemoryStore, target_id: TargetId, lsl: f64, usl: f64) -> Spec {
    store
        .create_spec(
            Spec::from_request(NewSpec {
                target_id,
                lsl,
                usl,
                reason: None,
            })
            .unwrap(),
        )
        .await
        .unwrap()
}

pub fn new_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}

/// Ten in-control points followed by one far outlier
pub fn outlier_series() -> Vec<f64> {
    let mut values = vec![10.0; 10];
    values.push(30.0);
    values
}
