//! Snapshot file error type.

use autoproc_domain::error::AutoProcError;

/// Errors originating from the snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotFileError {
    /// Reading, writing or renaming the file failed.
    #[error("snapshot file error")]
    Io(#[from] std::io::Error),

    /// The file does not hold a valid snapshot document.
    #[error("snapshot JSON error")]
    Json(#[from] serde_json::Error),
}

impl From<SnapshotFileError> for AutoProcError {
    fn from(err: SnapshotFileError) -> Self {
        Self::Storage(Box::new(err))
    }
}
