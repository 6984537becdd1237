use crate::error::{AppError, Result};
use crate::models::{AlertStatus, Measurement, Spec, SpcAlert, SpecLimits, TargetId};
use crate::state::{AlertFilter, AlertStore, MeasurementStore, SpecStore, TimeRange};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory store (for tests, the CLI and embedding)
///
/// All spec versions live behind one lock, so deactivating the previous
/// version and activating the new one is a single atomic step.
#[derive(Clone)]
pub struct InMemoryStore {
    measurements: Arc<DashMap<Uuid, Measurement>>,
    specs: Arc<RwLock<HashMap<TargetId, Vec<Spec>>>>,
    alerts: Arc<DashMap<Uuid, SpcAlert>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            measurements: Arc::new(DashMap::new()),
            specs: Arc::new(RwLock::new(HashMap::new())),
            alerts: Arc::new(DashMap::new()),
        }
    }

    pub fn measurement_count(&self) -> usize {
        self.measurements.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MeasurementStore for InMemoryStore {
    async fn save_measurement(&self, measurement: &Measurement) -> Result<()> {
        self.measurements.insert(measurement.id, measurement.clone());
        tracing::debug!(
            measurement_id = %measurement.id,
            target_id = measurement.target_id,
            "Measurement saved"
        );
        Ok(())
    }

    async fn get_measurement(&self, id: &Uuid) -> Result<Option<Measurement>> {
        Ok(self.measurements.get(id).map(|entry| entry.clone()))
    }

    async fn update_measurement(&self, measurement: &Measurement) -> Result<()> {
        match self.measurements.get_mut(&measurement.id) {
            Some(mut entry) => {
                *entry = measurement.clone();
                tracing::debug!(measurement_id = %measurement.id, "Measurement updated");
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Measurement {} not found",
                measurement.id
            ))),
        }
    }

    async fn is_duplicate_measurement(&self, target_id: TargetId, lot_no: &str, wafer_no: &str) -> Result<bool> {
        Ok(self.measurements.iter().any(|entry| {
            entry.target_id == target_id
                && entry.lot_no.as_deref() == Some(lot_no)
                && entry.wafer_no.as_deref() == Some(wafer_no)
        }))
    }

    async fn fetch_measurements(&self, target_id: TargetId, range: &TimeRange) -> Result<Vec<Measurement>> {
        let mut measurements: Vec<Measurement> = self
            .measurements
            .iter()
            .filter(|entry| entry.target_id == target_id && range.contains(entry.created_at))
            .map(|entry| entry.value().clone())
            .collect();

        // Oldest first; id breaks ties so repeated reads agree
        measurements.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(measurements)
    }
}

#[async_trait]
impl SpecStore for InMemoryStore {
    async fn create_spec(&self, mut spec: Spec) -> Result<Spec> {
        let mut specs = self.specs.write();
        let versions = specs.entry(spec.target_id).or_default();

        for version in versions.iter_mut() {
            version.is_active = false;
        }
        spec.is_active = true;
        versions.push(spec.clone());

        tracing::info!(
            spec_id = %spec.id,
            target_id = spec.target_id,
            lsl = spec.limits.lsl,
            usl = spec.limits.usl,
            "Spec created and activated"
        );
        Ok(spec)
    }

    async fn activate_spec(&self, id: &Uuid) -> Result<Spec> {
        let mut specs = self.specs.write();
        let versions = specs
            .values_mut()
            .find(|versions| versions.iter().any(|spec| spec.id == *id))
            .ok_or_else(|| AppError::NotFound(format!("Spec {} not found", id)))?;

        let mut activated = None;
        for version in versions.iter_mut() {
            version.is_active = version.id == *id;
            if version.is_active {
                activated = Some(version.clone());
            }
        }

        let spec = activated.ok_or_else(|| AppError::NotFound(format!("Spec {} not found", id)))?;
        tracing::info!(spec_id = %spec.id, target_id = spec.target_id, "Spec activated");
        Ok(spec)
    }

    async fn fetch_active_spec(&self, target_id: TargetId) -> Result<Option<SpecLimits>> {
        let specs = self.specs.read();
        Ok(specs
            .get(&target_id)
            .and_then(|versions| versions.iter().find(|spec| spec.is_active))
            .map(|spec| spec.limits))
    }

    async fn list_specs(&self, target_id: TargetId) -> Result<Vec<Spec>> {
        let specs = self.specs.read();
        Ok(specs.get(&target_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl AlertStore for InMemoryStore {
    async fn persist_alert(&self, measurement_id: &Uuid, rule_id: u8, description: &str) -> Result<SpcAlert> {
        if !self.measurements.contains_key(measurement_id) {
            return Err(AppError::NotFound(format!(
                "Measurement {} not found",
                measurement_id
            )));
        }

        let alert = SpcAlert::new(*measurement_id, rule_id, description.to_string());
        self.alerts.insert(alert.id, alert.clone());

        tracing::info!(
            alert_id = %alert.id,
            measurement_id = %measurement_id,
            rule_id,
            "SPC alert created"
        );
        Ok(alert)
    }

    async fn update_alert_status(&self, id: &Uuid, status: AlertStatus) -> Result<SpcAlert> {
        let mut entry = self
            .alerts
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Alert {} not found", id)))?;

        entry.transition(status)?;
        tracing::info!(alert_id = %id, status = %status, "SPC alert status updated");
        Ok(entry.clone())
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<SpcAlert>> {
        let mut alerts: Vec<SpcAlert> = self
            .alerts
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|alert| {
                let status_match = filter.statuses.is_empty() || filter.statuses.contains(&alert.status);

                let target_match = filter.target_id.map_or(true, |target_id| {
                    self.measurements
                        .get(&alert.measurement_id)
                        .map_or(false, |m| m.target_id == target_id)
                });

                let time_match = filter.created.contains(alert.created_at);

                status_match && target_match && time_match
            })
            .collect();

        // Newest first
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(alerts)
    }
}
