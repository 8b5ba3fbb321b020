//! # autoproc-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **REST-ish JSON API** over the `ProcessAutomation` service
//!   (`/api/processes`, `/api/procedures/{name}`, `/api/configuration`, …)
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application errors into status codes with a JSON `{ "error": … }` body
//!
//! ## Dependency rule
//! Depends on `autoproc-app` (for port traits and services) and `autoproc-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
