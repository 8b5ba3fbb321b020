//! Process automation service — the single entry point used by driving adapters.

use std::sync::Arc;
use std::time::Duration;

use autoproc_domain::control::{SequelControl, TimeScheduleControl};
use autoproc_domain::error::AutoProcError;
use autoproc_domain::param::Params;
use autoproc_domain::procedure::{ProcedureConfig, ProcedureDescriptor};
use autoproc_domain::process::ProcessType;
use autoproc_domain::restriction::Restriction;
use autoproc_domain::snapshot::Snapshot;

use crate::config_controller::AutomationConfigController;
use crate::exec_agent::ExecutionAgent;
use crate::ports::{ControlPlane, MessageBroker, SnapshotStore};

/// Configuration and execution behind one cloneable handle.
pub struct ProcessAutomation<CP, SS, B> {
    config: Arc<AutomationConfigController<CP, SS>>,
    agent: ExecutionAgent<CP, SS, B>,
}

impl<CP, SS, B> Clone for ProcessAutomation<CP, SS, B> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            agent: self.agent.clone(),
        }
    }
}

impl<CP, SS, B> ProcessAutomation<CP, SS, B>
where
    CP: ControlPlane + Send + Sync,
    SS: SnapshotStore + Send + Sync,
    B: MessageBroker + Send + Sync + 'static,
{
    pub fn new(
        config: AutomationConfigController<CP, SS>,
        broker: B,
        default_timeout: Duration,
    ) -> Self {
        let config = Arc::new(config);
        let agent = ExecutionAgent::new(Arc::clone(&config), Arc::new(broker), default_timeout);
        Self { config, agent }
    }

    /// The underlying controller, for operations not wrapped here.
    #[must_use]
    pub fn config(&self) -> &AutomationConfigController<CP, SS> {
        &self.config
    }

    /// # Errors
    ///
    /// See [`ExecutionAgent::execute`].
    pub async fn execute(
        &self,
        process: &str,
        message: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value, AutoProcError> {
        self.agent.execute(process, message, timeout).await
    }

    pub async fn process_types(&self) -> Vec<ProcessType> {
        self.config.all_process_types().await
    }

    /// # Errors
    ///
    /// Returns [`AutoProcError::InvalidProcessType`] for an unknown process.
    pub async fn process_type(&self, name: &str) -> Result<ProcessType, AutoProcError> {
        self.config.process_type(name).await
    }

    /// # Errors
    ///
    /// Returns [`AutoProcError::NotFound`] for an unknown procedure.
    pub async fn procedure(&self, name: &str) -> Result<ProcedureDescriptor, AutoProcError> {
        self.config.procedure_descriptor(name).await
    }

    /// # Errors
    ///
    /// See [`AutomationConfigController::process_procedures`].
    pub async fn procedures(&self, process: &str) -> Result<Vec<ProcedureConfig>, AutoProcError> {
        self.config.process_procedures(process).await
    }

    /// # Errors
    ///
    /// See [`AutomationConfigController::set_procedure_status`].
    pub async fn set_procedure_status(
        &self,
        procedure: &str,
        enabled: bool,
        result_returning: bool,
        params: Params,
    ) -> Result<ProcedureConfig, AutoProcError> {
        self.config
            .set_procedure_status(procedure, enabled, result_returning, params)
            .await
    }

    /// # Errors
    ///
    /// See [`AutomationConfigController::time_schedules_by_type`].
    pub async fn schedules(&self, process: &str) -> Result<Vec<TimeScheduleControl>, AutoProcError> {
        self.config.time_schedules_by_type(process).await
    }

    /// # Errors
    ///
    /// See [`AutomationConfigController::set_control_schedule`].
    pub async fn set_schedule(
        &self,
        process: &str,
        schedule_id: &str,
        time_pattern: &str,
        message: serde_json::Value,
        enabled: bool,
    ) -> Result<Option<String>, AutoProcError> {
        self.config
            .set_control_schedule(process, schedule_id, time_pattern, message, enabled)
            .await
    }

    /// # Errors
    ///
    /// See [`AutomationConfigController::schedule_process_asap`].
    pub async fn run_schedule_now(&self, process: &str, schedule_id: &str) -> Result<(), AutoProcError> {
        self.config.schedule_process_asap(process, schedule_id).await
    }

    /// # Errors
    ///
    /// See [`AutomationConfigController::process_sequels_by_precursor`].
    pub async fn sequels(
        &self,
        precursor: &str,
        enabled_only: bool,
    ) -> Result<Vec<SequelControl>, AutoProcError> {
        self.config
            .process_sequels_by_precursor(precursor, enabled_only)
            .await
    }

    /// Enable or disable the sequel from `precursor` to `successor`.
    ///
    /// # Errors
    ///
    /// Returns [`AutoProcError::InvalidProcessType`] for an unknown process and
    /// a validation error when `successor` does not accept the result of
    /// `precursor`.
    pub async fn set_sequel(
        &self,
        precursor: &str,
        successor: &str,
        enabled: bool,
    ) -> Result<SequelControl, AutoProcError> {
        let sequel = SequelControl::new(
            self.config.process_type(precursor).await?,
            self.config.process_type(successor).await?,
            enabled,
        )?;
        self.config.set_control_sequel(&sequel, enabled).await?;
        Ok(sequel)
    }

    /// Replace the restriction of `process` from its comma-separated form.
    ///
    /// A missing or blank list clears the restriction.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid list or
    /// [`AutoProcError::InvalidProcessType`] for an unknown process.
    pub async fn set_restriction(
        &self,
        process: &str,
        excludes: Option<&str>,
    ) -> Result<ProcessType, AutoProcError> {
        let restriction = parse_restriction(excludes)?;
        self.config.set_restriction(process, restriction).await
    }

    /// # Errors
    ///
    /// Propagates control-plane failures.
    pub async fn snapshot(&self) -> Result<Snapshot, AutoProcError> {
        self.config.current_snapshot().await
    }

    /// # Errors
    ///
    /// See [`AutomationConfigController::load_configuration`].
    pub async fn load(&self, snapshot: &Snapshot) -> Result<(), AutoProcError> {
        self.config.load_configuration(snapshot).await
    }

    /// # Errors
    ///
    /// See [`AutomationConfigController::reset_configuration`].
    pub async fn reset(&self) -> Result<(), AutoProcError> {
        self.config.reset_configuration().await
    }

    /// # Errors
    ///
    /// See [`AutomationConfigController::store_configuration`].
    pub async fn store(&self) -> Result<Snapshot, AutoProcError> {
        self.config.store_configuration().await
    }
}

/// Optional restriction from its comma-separated form; blank means none.
///
/// # Errors
///
/// Returns a validation error when a token is not a single word.
pub fn parse_restriction(excludes: Option<&str>) -> Result<Option<Restriction>, AutoProcError> {
    match excludes.map(str::trim) {
        None | Some("") => Ok(None),
        Some(excludes) => Ok(Some(excludes.parse()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoproc_domain::error::ValidationError;

    #[test]
    fn should_clear_restriction_when_list_is_blank() {
        assert!(parse_restriction(None).unwrap().is_none());
        assert!(parse_restriction(Some("  ")).unwrap().is_none());
    }

    #[test]
    fn should_parse_comma_separated_restriction() {
        let restriction = parse_restriction(Some("closed, archived")).unwrap().unwrap();
        assert_eq!(restriction.restricted_states(), ["closed", "archived"]);
    }

    #[test]
    fn should_reject_restriction_with_phrase() {
        let result = parse_restriction(Some("on hold"));
        assert!(matches!(
            result,
            Err(AutoProcError::Validation(ValidationError::InvalidRestriction { .. }))
        ));
    }
}
