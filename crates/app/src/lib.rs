//! # autoproc-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ControlPlane` — starters, jobs and their masters in the job-control engine
//!   - `MessageBroker` — request/reply publication of process invocations
//!   - `SnapshotStore` — persistence of the loaded configuration
//! - Hold the immutable **process registry** assembled at startup
//! - Keep the control plane consistent with the model (`AutomationConfigController`)
//! - Run processes and reduce their outcomes (`ExecutionAgent`)
//! - Expose both through the `ProcessAutomation` service
//!
//! ## Dependency rule
//! Depends on `autoproc-domain` only (plus `tokio` for locking, spawning and timeouts).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod config_controller;
pub mod exec_agent;
pub mod ports;
pub mod registry;
pub mod services;
