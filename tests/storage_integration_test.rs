mod common;

use common::*;
use dicd_spc::{
    config::{StateBackend, StateConfig},
    models::{AlertStatus, NewMeasurement, PositionMap},
    state::{
        create_store, AlertFilter, AlertStore, InMemoryStore, MeasurementStore, SpecStore, TimeRange,
    },
};
use std::io::Write;
use std::sync::Arc;

/// Test suite that runs against any store implementing all three traits
async fn test_store_operations<S>(store: Arc<S>)
where
    S: MeasurementStore + SpecStore + AlertStore + 'static,
{
    // Test 1: save and retrieve
    let measurement = uniform_measurement(1, 10.0, 5);
    let id = measurement.id;
    store.save_measurement(&measurement).await.unwrap();

    let retrieved = store.get_measurement(&id).await.unwrap().unwrap();
    assert_eq!(retrieved.avg_value(), 10.0);

    // Test 2: resubmission recomputes the aggregate
    let mut updated = retrieved;
    updated
        .resubmit(NewMeasurement::new(
            1,
            PositionMap {
                top: 1.0,
                center: 2.0,
                bottom: 3.0,
                left: 4.0,
                right: 5.0,
            },
        ))
        .unwrap();
    store.update_measurement(&updated).await.unwrap();

    let retrieved = store.get_measurement(&id).await.unwrap().unwrap();
    assert_eq!(retrieved.avg_value(), 3.0);
    assert_eq!(retrieved.summary.max_value, 5.0);
    assert!(retrieved.updated_at.is_some());

    // Test 3: single active spec per target
    let first = store
        .create_spec(dicd_spc::models::Spec::from_request(dicd_spc::models::NewSpec {
            target_id: 1,
            lsl: 0.0,
            usl: 10.0,
            reason: Some("initial".to_string()),
        })
        .unwrap())
        .await
        .unwrap();
    assert!(first.is_active);

    let second = store
        .create_spec(dicd_spc::models::Spec::from_request(dicd_spc::models::NewSpec {
            target_id: 1,
            lsl: 2.0,
            usl: 8.0,
            reason: None,
        })
        .unwrap())
        .await
        .unwrap();

    let versions = store.list_specs(1).await.unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions.iter().filter(|s| s.is_active).count(), 1);
    assert_eq!(store.fetch_active_spec(1).await.unwrap().unwrap().lsl, 2.0);

    store.activate_spec(&first.id).await.unwrap();
    assert_eq!(store.fetch_active_spec(1).await.unwrap().unwrap().lsl, 0.0);
    let versions = store.list_specs(1).await.unwrap();
    assert!(!versions.iter().find(|s| s.id == second.id).unwrap().is_active);

    // Test 4: alert review cycle
    let alert = store.persist_alert(&id, 3, "Nelson Rule 3 violation").await.unwrap();
    assert_eq!(alert.status, AlertStatus::New);

    let alert = store.update_alert_status(&alert.id, AlertStatus::InReview).await.unwrap();
    let alert = store.update_alert_status(&alert.id, AlertStatus::Exception).await.unwrap();
    assert!(!alert.status.is_open());
    assert!(alert.updated_at.is_some());

    let open = store
        .list_alerts(&AlertFilter {
            statuses: vec![AlertStatus::New, AlertStatus::InReview],
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(open.is_empty());

    let for_target = store
        .list_alerts(&AlertFilter {
            target_id: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(for_target.len(), 1);
}

#[tokio::test]
async fn test_in_memory_store() {
    test_store_operations(Arc::new(InMemoryStore::new())).await;
}

#[tokio::test]
async fn test_concurrent_spec_creation_keeps_one_active() {
    let store = new_store();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { seed_spec(&store, 20, 0.0, 10.0 + i as f64).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let versions = store.list_specs(20).await.unwrap();
    assert_eq!(versions.len(), 16);
    assert_eq!(versions.iter().filter(|s| s.is_active).count(), 1);
}

#[tokio::test]
async fn test_snapshot_backend() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "measurements": [
                {{"target_id": 5, "values": {{"top": 9.0, "center": 9.0, "bottom": 9.0, "left": 9.0, "right": 9.0}}, "created_at": "2024-03-01T08:00:00Z"}},
                {{"target_id": 5, "values": {{"top": 11.0, "center": 11.0, "bottom": 11.0, "left": 11.0, "right": 11.0}}, "created_at": "2024-03-01T09:00:00Z"}}
            ],
            "specs": [{{"target_id": 5, "lsl": 4.0, "usl": 16.0}}]
        }}"#
    )
    .unwrap();

    let store = create_store(&StateConfig {
        backend: StateBackend::Snapshot,
        snapshot_path: Some(file.path().to_path_buf()),
    })
    .await
    .unwrap();

    let measurements = store.fetch_measurements(5, &TimeRange::all()).await.unwrap();
    assert_eq!(measurements.len(), 2);
    assert_eq!(measurements[0].avg_value(), 9.0);

    let engine = dicd_spc::analytics::AnalyticsEngine::with_defaults(store.clone(), store.clone());
    let report = engine.process_statistics(5, &TimeRange::all()).await.unwrap();
    assert_eq!(report.overall_statistics.mean, Some(10.0));
    assert!(report.process_capability.unwrap().is_computable());
}
