//! # autoproc-adapter-inprocess
//!
//! In-process implementation of the control plane and message broker ports.
//!
//! ## Responsibilities
//! - Keep master starters, master jobs, starters and jobs in memory
//!   (`ControlPlane`)
//! - Deliver execution requests to the message starter subscribed to a topic
//!   and run its procedure jobs (`MessageBroker`)
//! - Run control jobs: schedule activations and sequels chained to a
//!   completed process. These runs honor the restriction carried by the
//!   master control job, and their failures are logged and kept in
//!   `InProcessEngine::recent_failures`
//!
//! Procedure implementations are plain closures registered by name. Time
//! patterns are stored but never evaluated; schedules only fire through
//! `activate_starter`.
//!
//! ## Dependency rule
//! Depends on `autoproc-app` (port traits) and `autoproc-domain` only.

mod broker;
mod control_plane;
mod engine;
mod error;

pub use engine::{InProcessEngine, MAX_SEQUEL_DEPTH, ProcedureFn};
pub use error::EngineError;
