//! Process registry — the immutable catalog of process types and procedures.
//!
//! The catalog is assembled once at startup through explicit registration
//! calls. Only process restrictions change afterwards.

use std::collections::BTreeMap;

use autoproc_domain::error::{
    AutoProcError, ConfigurationError, InvalidProcessTypeError, NotFoundError,
};
use autoproc_domain::procedure::ProcedureDescriptor;
use autoproc_domain::process::ProcessType;
use autoproc_domain::restriction::Restriction;

/// Lookup tables of registered process types and their procedures.
#[derive(Debug, Clone, Default)]
pub struct ProcessRegistry {
    processes: BTreeMap<String, ProcessType>,
    procedures: BTreeMap<String, ProcedureDescriptor>,
    by_process: BTreeMap<String, Vec<String>>,
}

impl ProcessRegistry {
    /// Start registering process types and procedures.
    #[must_use]
    pub fn builder() -> ProcessRegistryBuilder {
        ProcessRegistryBuilder::default()
    }

    /// # Errors
    ///
    /// Returns [`InvalidProcessTypeError`] when `name` was never registered.
    pub fn process_type(&self, name: &str) -> Result<&ProcessType, InvalidProcessTypeError> {
        self.processes
            .get(name)
            .ok_or_else(|| InvalidProcessTypeError {
                name: name.to_string(),
            })
    }

    /// All process types, ordered by name.
    pub fn process_types(&self) -> impl Iterator<Item = &ProcessType> {
        self.processes.values()
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no procedure is called `name`.
    pub fn procedure(&self, name: &str) -> Result<&ProcedureDescriptor, NotFoundError> {
        self.procedures.get(name).ok_or_else(|| NotFoundError {
            entity: "Procedure",
            id: name.to_string(),
        })
    }

    /// All procedures, ordered by name.
    pub fn procedures(&self) -> impl Iterator<Item = &ProcedureDescriptor> {
        self.procedures.values()
    }

    /// Procedures of `process` in registration order.
    pub fn procedures_of(&self, process: &str) -> impl Iterator<Item = &ProcedureDescriptor> {
        self.by_process
            .get(process)
            .into_iter()
            .flatten()
            .filter_map(|name| self.procedures.get(name))
    }

    /// Process types accepting the result of `precursor` as their message.
    pub fn sequel_candidates<'a>(
        &'a self,
        precursor: &'a ProcessType,
    ) -> impl Iterator<Item = &'a ProcessType> {
        self.processes.values().filter(move |p| {
            p.name != precursor.name && p.msg_kind.is_assignable_from(&precursor.result_kind)
        })
    }

    /// Replace the restriction of `process`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProcessTypeError`] when `process` was never registered.
    pub fn set_restriction(
        &mut self,
        process: &str,
        restriction: Option<Restriction>,
    ) -> Result<&ProcessType, InvalidProcessTypeError> {
        let entry = self
            .processes
            .get_mut(process)
            .ok_or_else(|| InvalidProcessTypeError {
                name: process.to_string(),
            })?;
        entry.restriction = restriction;
        Ok(entry)
    }
}

/// Collects registrations and checks them as a whole.
#[derive(Debug, Default)]
pub struct ProcessRegistryBuilder {
    processes: Vec<ProcessType>,
    procedures: Vec<ProcedureDescriptor>,
}

impl ProcessRegistryBuilder {
    #[must_use]
    pub fn register_process_type(mut self, process: ProcessType) -> Self {
        self.processes.push(process);
        self
    }

    #[must_use]
    pub fn register_procedure(mut self, procedure: ProcedureDescriptor) -> Self {
        self.procedures.push(procedure);
        self
    }

    /// Build the immutable lookup tables.
    ///
    /// # Errors
    ///
    /// - [`AutoProcError::Validation`] for an invalid process type or procedure
    /// - [`ConfigurationError::DuplicateProcessType`] for a process name registered twice
    /// - [`ConfigurationError::DuplicateProcedure`] for a procedure name registered twice
    /// - [`ConfigurationError::UnknownOwner`] for a procedure of an unregistered process
    pub fn build(self) -> Result<ProcessRegistry, AutoProcError> {
        let mut registry = ProcessRegistry::default();
        for process in self.processes {
            process.validate()?;
            if registry.processes.contains_key(&process.name) {
                return Err(ConfigurationError::DuplicateProcessType { name: process.name }.into());
            }
            registry.by_process.insert(process.name.clone(), Vec::new());
            registry.processes.insert(process.name.clone(), process);
        }
        for procedure in self.procedures {
            procedure.validate()?;
            if registry.procedures.contains_key(&procedure.name) {
                return Err(ConfigurationError::DuplicateProcedure {
                    name: procedure.name,
                }
                .into());
            }
            let Some(owned) = registry.by_process.get_mut(&procedure.process) else {
                return Err(ConfigurationError::UnknownOwner {
                    procedure: procedure.name,
                    process: procedure.process,
                }
                .into());
            };
            owned.push(procedure.name.clone());
            registry
                .procedures
                .insert(procedure.name.clone(), procedure);
        }
        Ok(registry)
    }
}
