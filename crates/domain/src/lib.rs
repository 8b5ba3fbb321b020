//! # autoproc-domain
//!
//! Pure domain model for the autoproc process automation core.
//!
//! ## Responsibilities
//! - Foundational types: error taxonomy, correlation ids, timestamps
//! - Define **process types** (named message → result units of automation)
//!   and the **procedures** they are composed of
//! - Define **restrictions** (state tokens that refuse an execution)
//! - Define **controls**: sequels chaining processes and time schedules
//! - Encode domain relationships into the flat **control-plane naming scheme**
//! - Define the **snapshot** document and typed parameter values
//! - Reduce procedure outcomes into one process result
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod control;
pub mod naming;
pub mod outcome;
pub mod param;
pub mod procedure;
pub mod process;
pub mod restriction;
pub mod snapshot;
