//! Alert candidates derived from pattern findings and spec violations.
//!
//! The engine only describes why an alert would be raised; persisting it is
//! up to the caller through [`crate::state::AlertStore::persist_alert`].

use crate::analytics::rules::PatternFinding;
use crate::models::{AlertCandidate, Measurement, Position, SpecLimits, SPEC_VIOLATION_RULE_ID};

/// One candidate per finding, attributed to the measurement that completed the pattern
///
/// `measurements` must be the same time-ordered sample the findings were computed on.
pub fn pattern_alerts(measurements: &[Measurement], findings: &[PatternFinding]) -> Vec<AlertCandidate> {
    findings
        .iter()
        .filter_map(|finding| {
            let measurement = measurements.get(finding.last_index())?;
            Some(AlertCandidate {
                measurement_id: measurement.id,
                rule_id: finding.rule.id(),
                description: format!(
                    "{} violation - {} ({})",
                    finding.rule.name(),
                    measurement.label(),
                    finding.description
                ),
            })
        })
        .collect()
}

/// Candidate for a measurement with any reading outside the spec band
pub fn spec_violation(measurement: &Measurement, spec: &SpecLimits) -> Option<AlertCandidate> {
    let out_of_spec: Vec<String> = measurement
        .values
        .iter()
        .filter(|(_, &value)| !spec.contains(value))
        .map(|(position, value)| out_of_spec_entry(position, *value, spec))
        .collect();

    if out_of_spec.is_empty() {
        return None;
    }

    Some(AlertCandidate {
        measurement_id: measurement.id,
        rule_id: SPEC_VIOLATION_RULE_ID,
        description: format!(
            "Spec limit violation - {}: {}",
            measurement.label(),
            out_of_spec.join(", ")
        ),
    })
}

fn out_of_spec_entry(position: Position, value: f64, spec: &SpecLimits) -> String {
    format!("{}: {} (spec {}~{})", position, value, spec.lsl, spec.usl)
}
