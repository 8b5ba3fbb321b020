//! JSON file implementation of [`SnapshotStore`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use autoproc_app::ports::SnapshotStore;
use autoproc_domain::error::AutoProcError;
use autoproc_domain::snapshot::Snapshot;

use crate::error::SnapshotFileError;

/// Snapshot store keeping one JSON document at `path`.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    async fn load(&self) -> Result<Option<Snapshot>, AutoProcError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(SnapshotFileError::from(err).into()),
        };
        let snapshot = serde_json::from_slice(&bytes).map_err(SnapshotFileError::from)?;
        tracing::debug!(path = %self.path.display(), "snapshot loaded");
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), AutoProcError> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(SnapshotFileError::from)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(SnapshotFileError::from)?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(SnapshotFileError::from)?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(SnapshotFileError::from)?;
        tracing::debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    async fn purge(&self) -> Result<(), AutoProcError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "snapshot purged");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SnapshotFileError::from(err).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoproc_domain::snapshot::{ProcedureEntry, RestrictionEntry};

    fn temp_store() -> JsonFileSnapshotStore {
        let dir = std::env::temp_dir().join(format!("autoproc-{}", uuid::Uuid::new_v4()));
        JsonFileSnapshotStore::new(dir.join("snapshot.json"))
    }

    fn sample() -> Snapshot {
        Snapshot {
            captured_at: None,
            restrictions: vec![RestrictionEntry {
                process: "Order".to_string(),
                excludes: Some("closed".to_string()),
            }],
            procedures: vec![ProcedureEntry {
                name: "Price".to_string(),
                result: true,
                properties: vec![],
            }],
            schedules: vec![],
            sequels: vec![],
        }
    }

    #[tokio::test]
    async fn should_load_nothing_when_file_is_missing() {
        let store = temp_store();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_load_saved_snapshot() {
        let store = temp_store();
        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(sample()));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn should_purge_saved_snapshot() {
        let store = temp_store();
        store.save(&sample()).await.unwrap();
        store.purge().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.purge().await.unwrap();
    }

    #[tokio::test]
    async fn should_report_storage_error_when_file_is_corrupt() {
        let store = temp_store();
        store.save(&sample()).await.unwrap();
        tokio::fs::write(store.path(), b"{ not json").await.unwrap();
        assert!(matches!(
            store.load().await,
            Err(AutoProcError::Storage(_))
        ));
    }
}
