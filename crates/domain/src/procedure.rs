//! Procedures — units of work belonging to one process type.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::param::Params;

/// How a procedure is enabled when the system starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureRole {
    /// Registered but disabled until configured.
    #[default]
    Optional,
    /// Enabled at startup, its result is discarded.
    Default,
    /// Enabled at startup, produces the process result.
    Result,
}

impl ProcedureRole {
    /// Startup enablement: `None` when disabled, else whether it returns the result.
    #[must_use]
    pub fn bootstrap_result(self) -> Option<bool> {
        match self {
            Self::Optional => None,
            Self::Default => Some(false),
            Self::Result => Some(true),
        }
    }
}

/// Static description of a registered procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureDescriptor {
    /// Unique across all procedures.
    pub name: String,
    pub description: String,
    /// Name of the owning process type.
    pub process: String,
    /// Implementation the control plane resolves to run this procedure.
    pub implementation: String,
    pub role: ProcedureRole,
}

impl ProcedureDescriptor {
    /// Describe procedure `name` of `process`, run by `implementation`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        process: impl Into<String>,
        implementation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            process: process.into(),
            implementation: implementation.into(),
            role: ProcedureRole::Optional,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: ProcedureRole) -> Self {
        self.role = role;
        self
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when the procedure, process or
    /// implementation name is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if [&self.name, &self.process, &self.implementation]
            .iter()
            .any(|s| s.trim().is_empty())
        {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }
}

/// Live configuration of a procedure, as reported by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureConfig {
    pub descriptor: ProcedureDescriptor,
    pub enabled: bool,
    pub has_result: bool,
    pub params: Params,
}

impl ProcedureConfig {
    /// A registered procedure without an enabling job.
    #[must_use]
    pub fn disabled(descriptor: ProcedureDescriptor) -> Self {
        Self {
            descriptor,
            enabled: false,
            has_result: false,
            params: Params::new(),
        }
    }
}
