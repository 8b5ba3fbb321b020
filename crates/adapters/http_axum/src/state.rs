//! Shared application state for axum handlers.

use std::sync::Arc;

use autoproc_app::ports::{ControlPlane, MessageBroker, SnapshotStore};
use autoproc_app::services::process_automation::ProcessAutomation;

/// Application state shared across all axum handlers.
///
/// Generic over the control plane, snapshot store and message broker to
/// avoid dynamic dispatch. `Clone` is implemented manually so only the
/// `Arc` is cloned.
pub struct AppState<CP, SS, B> {
    /// Process configuration and execution service.
    pub automation: Arc<ProcessAutomation<CP, SS, B>>,
}

impl<CP, SS, B> Clone for AppState<CP, SS, B> {
    fn clone(&self) -> Self {
        Self {
            automation: Arc::clone(&self.automation),
        }
    }
}

impl<CP, SS, B> AppState<CP, SS, B>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    pub fn new(automation: ProcessAutomation<CP, SS, B>) -> Self {
        Self {
            automation: Arc::new(automation),
        }
    }
}
