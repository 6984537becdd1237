use crate::config::{StateBackend, StateConfig};
use crate::error::{AppError, Result};
use crate::state::{load_snapshot, InMemoryStore};
use std::sync::Arc;

/// Create a store based on configuration
pub async fn create_store(config: &StateConfig) -> Result<Arc<InMemoryStore>> {
    match config.backend {
        StateBackend::Memory => Ok(create_in_memory_store()),

        StateBackend::Snapshot => {
            let path = config.snapshot_path.as_ref().ok_or_else(|| {
                AppError::Configuration(
                    "Snapshot backend requires 'snapshot_path' configuration".to_string(),
                )
            })?;

            tracing::info!(path = ?path, "Initializing snapshot-seeded storage backend");

            let store = load_snapshot(path).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Create an empty in-memory store (for testing and development)
pub fn create_in_memory_store() -> Arc<InMemoryStore> {
    tracing::info!("Initializing in-memory storage backend");
    Arc::new(InMemoryStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SpecStore, TimeRange};
    use crate::state::MeasurementStore;
    use std::io::Write;

    #[tokio::test]
    async fn test_create_memory_store() {
        let store = create_store(&StateConfig::default()).await.unwrap();
        assert_eq!(store.measurement_count(), 0);
    }

    #[tokio::test]
    async fn test_create_snapshot_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"measurements": [{{"target_id": 3, "values": {{"top": 1.0, "center": 1.0, "bottom": 1.0, "left": 1.0, "right": 1.0}}}}],
                "specs": [{{"target_id": 3, "lsl": 0.5, "usl": 1.5}}]}}"#
        )
        .unwrap();

        let config = StateConfig {
            backend: StateBackend::Snapshot,
            snapshot_path: Some(file.path().to_path_buf()),
        };

        let store = create_store(&config).await.unwrap();
        assert_eq!(store.fetch_measurements(3, &TimeRange::all()).await.unwrap().len(), 1);
        assert!(store.fetch_active_spec(3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_snapshot_requires_path() {
        let config = StateConfig {
            backend: StateBackend::Snapshot,
            snapshot_path: None,
        };

        let result = create_store(&config).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
