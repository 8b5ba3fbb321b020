//! Common error types used across the workspace.
//!
//! [`AutoProcError`] is the workspace-wide error. Each concern has its own
//! typed error that converts into it via `#[from]`; adapters wrap their
//! failures in the boxed [`AutoProcError::ControlPlane`],
//! [`AutoProcError::Messaging`] or [`AutoProcError::Storage`] variants.

use std::error::Error;

/// Boxed error coming from an adapter.
pub type BoxedError = Box<dyn Error + Send + Sync>;

/// Top-level error for every autoproc operation.
#[derive(Debug, thiserror::Error)]
pub enum AutoProcError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    InvalidProcessType(#[from] InvalidProcessTypeError),

    #[error(transparent)]
    RestrictionViolation(#[from] RestrictionViolationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("naming error: {0}")]
    Naming(#[from] NamingError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("control plane error")]
    ControlPlane(#[source] BoxedError),

    #[error("messaging error")]
    Messaging(#[source] BoxedError),

    #[error("storage error")]
    Storage(#[source] BoxedError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name {name:?} must not contain {character:?}")]
    ReservedCharacter { name: String, character: char },

    #[error("restriction must contain at least one state")]
    EmptyRestriction,

    #[error("restriction {tokens:?} is not a list of whole words")]
    InvalidRestriction { tokens: String },

    #[error(
        "process {successor} expects {expected} messages but {precursor} produces {actual} results"
    )]
    KindMismatch {
        precursor: String,
        successor: String,
        expected: String,
        actual: String,
    },

    #[error("schedule id must not be empty")]
    EmptyScheduleId,

    #[error("time pattern must not be empty")]
    EmptyTimePattern,

    #[error("schedule message must be a JSON object")]
    InvalidScheduleMessage,

    #[error("schedule message field {field:?} must hold a scalar value")]
    NestedScheduleField { field: String },

    #[error("unknown property type {0:?}")]
    UnknownPropType(String),

    #[error("value {raw:?} is not a valid {tag}")]
    InvalidParamValue { tag: &'static str, raw: String },
}

/// Registry and snapshot consistency failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("process type {name} is registered twice")]
    DuplicateProcessType { name: String },

    #[error("procedure {name} is registered twice")]
    DuplicateProcedure { name: String },

    #[error("procedure {procedure} belongs to unregistered process type {process}")]
    UnknownOwner { procedure: String, process: String },

    #[error("snapshot cannot be applied: {0}")]
    InvalidSnapshot(#[source] Box<AutoProcError>),
}

/// Lookup of a process type that was never registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("process type {name} is not registered")]
pub struct InvalidProcessTypeError {
    pub name: String,
}

/// Execution refused because the message state context is restricted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("process {process} may not run while in state {state:?}")]
pub struct RestrictionViolationError {
    pub process: String,
    pub state: String,
}

/// Failure of a process invocation as a whole.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("process {process} failed: {root_cause}")]
    Aggregate {
        process: String,
        root_cause: String,
        failures: Vec<String>,
    },

    #[error("no result found for process {process}")]
    NoResult { process: String },

    #[error("process {process} did not complete within {timeout_ms} ms")]
    Timeout { process: String, timeout_ms: u128 },
}

/// A control-plane identifier that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    #[error("{name:?} does not start with {prefix:?}")]
    MissingPrefix { name: String, prefix: &'static str },

    #[error("{name:?} does not end with {suffix:?}")]
    MissingSuffix { name: String, suffix: &'static str },

    #[error("{name:?} does not contain {delimiter:?}")]
    MissingDelimiter {
        name: String,
        delimiter: &'static str,
    },
}

/// Lookup of an entity that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

impl ConfigurationError {
    /// Wrap the error that prevented a snapshot from resolving.
    #[must_use]
    pub fn invalid_snapshot(cause: impl Into<AutoProcError>) -> Self {
        Self::InvalidSnapshot(Box::new(cause.into()))
    }
}
