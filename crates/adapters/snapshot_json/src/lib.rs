//! # autoproc-adapter-snapshot-json
//!
//! File persistence of the configuration snapshot as pretty-printed JSON.
//!
//! ## Responsibilities
//! - Implement the `SnapshotStore` port defined in `autoproc-app::ports`
//! - Replace the file atomically (write to a sibling temp file, then rename)
//! - Treat a missing file as "nothing persisted"
//!
//! ## Dependency rule
//! Depends on `autoproc-app` (for the port trait) and `autoproc-domain` (for the snapshot type).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod store;

pub use error::SnapshotFileError;
pub use store::JsonFileSnapshotStore;
