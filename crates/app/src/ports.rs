//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod control_plane;
pub mod message_broker;
pub mod snapshot_store;

pub use control_plane::{ControlPlane, JobDef, MasterDef, Props, StarterDef};
pub use message_broker::{ExecutionRequest, MessageBroker};
pub use snapshot_store::SnapshotStore;
