//! Snapshot store port — persistence of the loaded configuration.

use std::future::Future;

use autoproc_domain::error::AutoProcError;
use autoproc_domain::snapshot::Snapshot;

/// Storage for the single persisted configuration snapshot.
pub trait SnapshotStore {
    /// Load the persisted snapshot, if one was saved.
    fn load(&self) -> impl Future<Output = Result<Option<Snapshot>, AutoProcError>> + Send;

    /// Replace the persisted snapshot.
    fn save(&self, snapshot: &Snapshot) -> impl Future<Output = Result<(), AutoProcError>> + Send;

    /// Remove the persisted snapshot. Purging an empty store is a no-op.
    fn purge(&self) -> impl Future<Output = Result<(), AutoProcError>> + Send;
}
