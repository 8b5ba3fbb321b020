//! Automation config controller — keeps the control plane wired to the
//! process automation model.
//!
//! At startup the controller defines the master starters, one message
//! starter and master control job per process type and one master job per
//! procedure, then applies the default procedure enablement and captures
//! the result as the *bootstrap snapshot*, the target of every reset.
//!
//! Afterwards it owns the enabled set of procedures, time schedules and
//! sequels. Every query and mutation runs under one lock so that callers
//! (e.g. the execution agent resolving a topic) always see a consistent
//! view. Enabling an enabled item or disabling an absent one is a no-op.

use std::collections::BTreeMap;

use tokio::sync::Mutex;

use autoproc_domain::control::{SequelControl, TimeScheduleControl};
use autoproc_domain::error::{AutoProcError, ConfigurationError, NotFoundError, ValidationError};
use autoproc_domain::naming::{self, props};
use autoproc_domain::param::{ParamValue, Params};
use autoproc_domain::procedure::{ProcedureConfig, ProcedureDescriptor};
use autoproc_domain::process::ProcessType;
use autoproc_domain::restriction::Restriction;
use autoproc_domain::snapshot::{
    self, ProcedureEntry, RestrictionEntry, ScheduleEntry, SequelEntry, Snapshot,
};
use autoproc_domain::time;

use crate::ports::{ControlPlane, JobDef, MasterDef, Props, SnapshotStore, StarterDef};
use crate::registry::ProcessRegistry;

/// Engine implementation of the message subscription master starter.
pub const MESSAGE_STARTER_IMPL: &str = "message-subscription";
/// Engine implementation of the chained master starter.
pub const CHAINED_STARTER_IMPL: &str = "chained";
/// Engine implementation of the time schedule master starter.
pub const SCHEDULE_STARTER_IMPL: &str = "time-schedule";
/// Engine implementation of master control jobs, running a whole process.
pub const PROCESS_CONTROL_IMPL: &str = "process-control";

/// Which process types a snapshot's procedure list replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcedureScope {
    /// Only process types owning a listed procedure.
    Listed,
    /// Every registered process type.
    All,
}

/// A snapshot whose names all resolved against the registry.
#[derive(Debug, Default)]
struct ResolvedSnapshot {
    procedures: BTreeMap<String, Vec<(ProcedureDescriptor, bool, Params)>>,
    schedules: Vec<TimeScheduleControl>,
    sequels: Vec<SequelControl>,
    restrictions: Vec<(String, Option<Restriction>)>,
}

/// Runtime owner of procedure, schedule and sequel enablement.
pub struct AutomationConfigController<CP, SS> {
    control_plane: CP,
    store: SS,
    registry: Mutex<ProcessRegistry>,
    bootstrap: Snapshot,
}

impl<CP, SS> AutomationConfigController<CP, SS>
where
    CP: ControlPlane + Send + Sync,
    SS: SnapshotStore + Send + Sync,
{
    /// Wire `registry` into the control plane and capture the bootstrap snapshot.
    ///
    /// # Errors
    ///
    /// Propagates control-plane failures; startup must abort on error.
    #[tracing::instrument(skip_all)]
    pub async fn bootstrap(
        registry: ProcessRegistry,
        control_plane: CP,
        store: SS,
    ) -> Result<Self, AutoProcError> {
        let mut controller = Self {
            control_plane,
            store,
            registry: Mutex::new(registry),
            bootstrap: Snapshot::default(),
        };

        let bootstrap = {
            let registry = controller.registry.lock().await;
            controller.define_masters(&registry).await?;
            for descriptor in registry.procedures() {
                if let Some(result_returning) = descriptor.role.bootstrap_result() {
                    controller
                        .enable_procedure(descriptor, result_returning, &Params::new())
                        .await?;
                }
            }
            controller.advise(&registry).await?;
            controller.capture(&registry).await?
        };
        tracing::info!(
            processes = bootstrap.restrictions.len(),
            procedures = bootstrap.procedures.len(),
            "process automation bootstrapped"
        );
        controller.bootstrap = bootstrap;
        Ok(controller)
    }

    /// State captured right after startup, the target of [`Self::reset_configuration`].
    #[must_use]
    pub fn bootstrap_snapshot(&self) -> &Snapshot {
        &self.bootstrap
    }

    /// Run `f` with the registry under the configuration lock.
    pub async fn with_exclusive_access<T>(&self, f: impl FnOnce(&ProcessRegistry) -> T) -> T {
        let registry = self.registry.lock().await;
        f(&registry)
    }

    /// # Errors
    ///
    /// Returns [`AutoProcError::InvalidProcessType`] for an unknown name.
    pub async fn process_type(&self, name: &str) -> Result<ProcessType, AutoProcError> {
        let registry = self.registry.lock().await;
        Ok(registry.process_type(name)?.clone())
    }

    pub async fn all_process_types(&self) -> Vec<ProcessType> {
        let registry = self.registry.lock().await;
        registry.process_types().cloned().collect()
    }

    /// # Errors
    ///
    /// Returns [`AutoProcError::NotFound`] for an unknown procedure.
    pub async fn procedure_descriptor(
        &self,
        name: &str,
    ) -> Result<ProcedureDescriptor, AutoProcError> {
        let registry = self.registry.lock().await;
        Ok(registry.procedure(name)?.clone())
    }

    /// Every procedure of `process`, disabled ones included.
    ///
    /// # Errors
    ///
    /// Returns [`AutoProcError::InvalidProcessType`] for an unknown process
    /// or a control-plane failure.
    pub async fn process_procedures(
        &self,
        process: &str,
    ) -> Result<Vec<ProcedureConfig>, AutoProcError> {
        let registry = self.registry.lock().await;
        registry.process_type(process)?;
        let mut configs = Vec::new();
        for descriptor in registry.procedures_of(process) {
            configs.push(self.procedure_config(descriptor).await?);
        }
        Ok(configs)
    }

    /// Active time schedules of `process`.
    ///
    /// # Errors
    ///
    /// Returns [`AutoProcError::InvalidProcessType`] for an unknown process
    /// or a control-plane failure.
    pub async fn time_schedules_by_type(
        &self,
        process: &str,
    ) -> Result<Vec<TimeScheduleControl>, AutoProcError> {
        let registry = self.registry.lock().await;
        registry.process_type(process)?;
        self.schedules_of(Some(process)).await
    }

    /// Sequels from `precursor` to every process accepting its result.
    ///
    /// With `enabled_only` the disabled candidates are left out.
    ///
    /// # Errors
    ///
    /// Returns [`AutoProcError::InvalidProcessType`] for an unknown process
    /// or a control-plane failure.
    pub async fn process_sequels_by_precursor(
        &self,
        precursor: &str,
        enabled_only: bool,
    ) -> Result<Vec<SequelControl>, AutoProcError> {
        let registry = self.registry.lock().await;
        let precursor = registry.process_type(precursor)?;
        let starter = naming::sequel_starter_name(&precursor.name);
        let mut sequels = Vec::new();
        for successor in registry.sequel_candidates(precursor) {
            let job_name =
                naming::control_job_name(&starter, Some(&naming::control_name(&successor.name)));
            let enabled = self.control_plane.job(&job_name).await?.is_some();
            if enabled || !enabled_only {
                sequels.push(SequelControl::new(
                    precursor.clone(),
                    successor.clone(),
                    enabled,
                )?);
            }
        }
        Ok(sequels)
    }

    /// Enable or disable procedure `procedure`.
    ///
    /// Enabling an enabled procedure with other params or result flag
    /// replaces its job.
    ///
    /// # Errors
    ///
    /// Returns [`AutoProcError::NotFound`] for an unknown procedure or a
    /// control-plane failure.
    #[tracing::instrument(skip(self, params))]
    pub async fn set_procedure_status(
        &self,
        procedure: &str,
        enabled: bool,
        result_returning: bool,
        params: Params,
    ) -> Result<ProcedureConfig, AutoProcError> {
        let registry = self.registry.lock().await;
        let descriptor = registry.procedure(procedure)?;
        if enabled {
            self.enable_procedure(descriptor, result_returning, &params)
                .await?;
        } else {
            self.disable_procedure(descriptor).await?;
        }
        self.procedure_config(descriptor).await
    }

    /// Enable (replacing any previous pattern and message) or disable a time schedule.
    ///
    /// Returns the schedule starter name, or `None` when disabling a
    /// schedule that did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AutoProcError::InvalidProcessType`], a validation error for
    /// an invalid schedule, or a control-plane failure.
    #[tracing::instrument(skip(self, message))]
    pub async fn set_control_schedule(
        &self,
        process: &str,
        schedule_id: &str,
        time_pattern: &str,
        message: serde_json::Value,
        enabled: bool,
    ) -> Result<Option<String>, AutoProcError> {
        let registry = self.registry.lock().await;
        registry.process_type(process)?;
        if enabled {
            let schedule = TimeScheduleControl::new(process, schedule_id, time_pattern, message)?;
            self.enable_schedule(&schedule).await.map(Some)
        } else {
            self.disable_schedule(process, schedule_id).await
        }
    }

    /// Enable or disable a sequel.
    ///
    /// # Errors
    ///
    /// Returns [`AutoProcError::InvalidProcessType`] when either process is
    /// not registered, or a control-plane failure.
    #[tracing::instrument(skip(self, sequel), fields(precursor = %sequel.precursor.name, successor = %sequel.successor.name))]
    pub async fn set_control_sequel(
        &self,
        sequel: &SequelControl,
        enabled: bool,
    ) -> Result<(), AutoProcError> {
        let registry = self.registry.lock().await;
        registry.process_type(&sequel.precursor.name)?;
        registry.process_type(&sequel.successor.name)?;
        self.apply_sequel(sequel, enabled).await
    }

    /// Replace the restriction of `process`.
    ///
    /// # Errors
    ///
    /// Returns [`AutoProcError::InvalidProcessType`] for an unknown process,
    /// or a control-plane failure.
    #[tracing::instrument(skip(self))]
    pub async fn set_restriction(
        &self,
        process: &str,
        restriction: Option<Restriction>,
    ) -> Result<ProcessType, AutoProcError> {
        let mut registry = self.registry.lock().await;
        let process = registry.set_restriction(process, restriction)?.clone();
        self.define_control_master(&process).await?;
        Ok(process)
    }

    /// Capture the live configuration.
    ///
    /// # Errors
    ///
    /// Propagates control-plane failures.
    pub async fn current_snapshot(&self) -> Result<Snapshot, AutoProcError> {
        let registry = self.registry.lock().await;
        self.capture(&registry).await
    }

    /// Make `snapshot` the live configuration.
    ///
    /// Every name is resolved before anything changes: an unknown process or
    /// procedure fails the whole load. Malformed entries are logged and
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSnapshot`] wrapping the
    /// resolution failure, or a control-plane failure while applying.
    #[tracing::instrument(skip_all)]
    pub async fn load_configuration(&self, snapshot: &Snapshot) -> Result<(), AutoProcError> {
        let mut registry = self.registry.lock().await;
        self.configure(&mut registry, snapshot, ProcedureScope::Listed)
            .await?;
        tracing::info!(
            procedures = snapshot.procedures.len(),
            schedules = snapshot.schedules.len(),
            sequels = snapshot.sequels.len(),
            "configuration loaded"
        );
        Ok(())
    }

    /// Restore the bootstrap configuration, restart the control plane and
    /// purge the persisted snapshot.
    ///
    /// In-flight executions may fail while the control plane restarts.
    ///
    /// # Errors
    ///
    /// Propagates control-plane and storage failures.
    #[tracing::instrument(skip_all)]
    pub async fn reset_configuration(&self) -> Result<(), AutoProcError> {
        let mut registry = self.registry.lock().await;
        self.configure(&mut registry, &self.bootstrap, ProcedureScope::All)
            .await?;
        self.control_plane.restart().await?;
        self.store.purge().await?;
        tracing::info!("configuration reset to bootstrap state");
        Ok(())
    }

    /// Persist the live configuration.
    ///
    /// # Errors
    ///
    /// Propagates control-plane and storage failures.
    #[tracing::instrument(skip_all)]
    pub async fn store_configuration(&self) -> Result<Snapshot, AutoProcError> {
        let registry = self.registry.lock().await;
        let snapshot = self.capture(&registry).await?;
        self.store.save(&snapshot).await?;
        tracing::info!("configuration stored");
        Ok(snapshot)
    }

    /// Load the persisted snapshot, if any. Returns whether one was applied.
    ///
    /// # Errors
    ///
    /// See [`Self::load_configuration`]; storage failures propagate too.
    pub async fn restore_persisted(&self) -> Result<bool, AutoProcError> {
        match self.store.load().await? {
            Some(snapshot) => {
                self.load_configuration(&snapshot).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Activate schedule `schedule_id` of `process` now.
    ///
    /// # Errors
    ///
    /// Returns [`AutoProcError::InvalidProcessType`], [`AutoProcError::NotFound`]
    /// when the schedule is not enabled, or a control-plane failure.
    #[tracing::instrument(skip(self))]
    pub async fn schedule_process_asap(
        &self,
        process: &str,
        schedule_id: &str,
    ) -> Result<(), AutoProcError> {
        let starter = {
            let registry = self.registry.lock().await;
            registry.process_type(process)?;
            let starter = naming::scheduled_starter_name(process, schedule_id);
            if self.control_plane.starter(&starter).await?.is_none() {
                return Err(NotFoundError {
                    entity: "Schedule",
                    id: starter,
                }
                .into());
            }
            starter
        };
        self.control_plane.activate_starter(&starter).await
    }

    async fn define_masters(&self, registry: &ProcessRegistry) -> Result<(), AutoProcError> {
        let parallel = Props::from([(props::PARALLEL_START.to_string(), true.into())]);
        for (name, description, implementation, props) in [
            (
                naming::MASTER_PROCESS_STARTER,
                "Message based process starter",
                MESSAGE_STARTER_IMPL,
                parallel.clone(),
            ),
            (
                naming::MASTER_CHAINED_STARTER,
                "Follow-up process starter",
                CHAINED_STARTER_IMPL,
                parallel,
            ),
            (
                naming::MASTER_SCHEDULE_STARTER,
                "Time scheduled process starter",
                SCHEDULE_STARTER_IMPL,
                Props::new(),
            ),
        ] {
            self.control_plane
                .define_master_starter(MasterDef {
                    name: name.to_string(),
                    description: description.to_string(),
                    implementation: implementation.to_string(),
                    props,
                })
                .await?;
        }

        for process in registry.process_types() {
            let starter = naming::starter_name(&process.name);
            let subject = naming::topic(&process.name);
            self.control_plane
                .define_starter(StarterDef {
                    name: starter.clone(),
                    master: naming::MASTER_PROCESS_STARTER.to_string(),
                    description: process.description.clone(),
                    props: Props::from([
                        (props::MSG_SUBJECT.to_string(), subject.clone().into()),
                        (props::RETURN_RESULT.to_string(), true.into()),
                    ]),
                })
                .await?;
            tracing::debug!(%starter, %subject, process = %process.name, "message starter defined");

            self.define_control_master(process).await?;
        }

        for descriptor in registry.procedures() {
            self.control_plane
                .define_master_job(MasterDef {
                    name: descriptor.name.clone(),
                    description: descriptor.description.clone(),
                    implementation: descriptor.implementation.clone(),
                    props: Props::new(),
                })
                .await?;
            tracing::debug!(procedure = %descriptor.name, "procedure master job defined");
        }
        Ok(())
    }

    /// (Re)define the master control job of `process`. It carries the
    /// restriction so that scheduled and chained runs honor it too.
    async fn define_control_master(&self, process: &ProcessType) -> Result<(), AutoProcError> {
        let master = naming::master_control_job_name(&naming::control_name(&process.name));
        let mut control_props = Props::from([(
            props::PROCESS_TYPE.to_string(),
            process.name.clone().into(),
        )]);
        if let Some(restriction) = &process.restriction {
            control_props.insert(
                props::PROCESS_RESTRICTION.to_string(),
                restriction.to_string().into(),
            );
        }
        self.control_plane
            .define_master_job(MasterDef {
                name: master.clone(),
                description: "Process control job".to_string(),
                implementation: PROCESS_CONTROL_IMPL.to_string(),
                props: control_props,
            })
            .await?;
        tracing::debug!(%master, process = %process.name, "control job defined");
        Ok(())
    }

    /// Log process types that will not produce exactly one result.
    async fn advise(&self, registry: &ProcessRegistry) -> Result<(), AutoProcError> {
        if registry.process_types().next().is_none() {
            tracing::warn!("no process types registered");
        }
        for process in registry.process_types() {
            let mut procedures = 0usize;
            let mut producers = Vec::new();
            for descriptor in registry.procedures_of(&process.name) {
                procedures += 1;
                let config = self.procedure_config(descriptor).await?;
                if config.enabled && config.has_result {
                    producers.push(descriptor.name.as_str());
                }
            }
            if procedures == 0 {
                tracing::warn!(process = %process.name, "process has no procedures");
            }
            match producers.len() {
                0 => tracing::warn!(
                    process = %process.name,
                    "process has no result procedure, executions will find no result"
                ),
                1 => {}
                _ => tracing::warn!(
                    process = %process.name,
                    procedures = %producers.join(", "),
                    "process has several result procedures, only the first result is returned"
                ),
            }
        }
        Ok(())
    }

    async fn enable_procedure(
        &self,
        descriptor: &ProcedureDescriptor,
        result_returning: bool,
        params: &Params,
    ) -> Result<(), AutoProcError> {
        let mut props: Props = params
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        if !result_returning {
            props.insert(props::NO_RESULT.to_string(), true.into());
        }
        let job = JobDef {
            name: naming::procedure_job_name(&descriptor.process, &descriptor.name),
            master: descriptor.name.clone(),
            starter: naming::starter_name(&descriptor.process),
            description: descriptor.description.clone(),
            props,
        };
        if self.control_plane.job(&job.name).await?.as_ref() == Some(&job) {
            return Ok(());
        }
        tracing::debug!(job = %job.name, result_returning, "procedure job defined");
        self.control_plane.define_job(job).await
    }

    async fn disable_procedure(&self, descriptor: &ProcedureDescriptor) -> Result<(), AutoProcError> {
        let name = naming::procedure_job_name(&descriptor.process, &descriptor.name);
        if self.control_plane.remove_job(&name).await?.is_some() {
            tracing::debug!(job = %name, "procedure job removed");
        }
        Ok(())
    }

    async fn procedure_config(
        &self,
        descriptor: &ProcedureDescriptor,
    ) -> Result<ProcedureConfig, AutoProcError> {
        let name = naming::procedure_job_name(&descriptor.process, &descriptor.name);
        let Some(job) = self.control_plane.job(&name).await? else {
            return Ok(ProcedureConfig::disabled(descriptor.clone()));
        };
        let no_result = job
            .props
            .get(props::NO_RESULT)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        let params = job
            .props
            .iter()
            .filter(|(key, _)| key.as_str() != props::NO_RESULT)
            .map(|(key, value)| (key.clone(), ParamValue::from_json(value)))
            .collect();
        Ok(ProcedureConfig {
            descriptor: descriptor.clone(),
            enabled: true,
            has_result: !no_result,
            params,
        })
    }

    async fn enable_schedule(&self, schedule: &TimeScheduleControl) -> Result<String, AutoProcError> {
        let starter = naming::scheduled_starter_name(&schedule.process, &schedule.schedule_id);
        self.control_plane.remove_starter(&starter).await?;
        self.control_plane
            .define_starter(StarterDef {
                name: starter.clone(),
                master: naming::MASTER_SCHEDULE_STARTER.to_string(),
                description: format!("Schedule {} activation", schedule.process),
                props: Props::from([
                    (
                        props::SCHEDULE_TIME.to_string(),
                        schedule.time_pattern.clone().into(),
                    ),
                    (props::PROCESS_MSG.to_string(), schedule.message.clone()),
                ]),
            })
            .await?;

        let job = naming::control_job_name(&starter, None);
        if self.control_plane.job(&job).await?.is_none() {
            self.control_plane
                .define_job(JobDef {
                    name: job,
                    master: naming::master_control_job_name(&naming::control_name(
                        &schedule.process,
                    )),
                    starter: starter.clone(),
                    description: format!("Schedule {} activation job", schedule.process),
                    props: Props::new(),
                })
                .await?;
        }
        tracing::debug!(%starter, time = %schedule.time_pattern, "schedule enabled");
        Ok(starter)
    }

    async fn disable_schedule(
        &self,
        process: &str,
        schedule_id: &str,
    ) -> Result<Option<String>, AutoProcError> {
        if schedule_id.trim().is_empty() {
            return Err(ValidationError::EmptyScheduleId.into());
        }
        let starter = naming::scheduled_starter_name(process, schedule_id);
        let removed = self.control_plane.remove_starter(&starter).await?;
        self.control_plane
            .remove_job(&naming::control_job_name(&starter, None))
            .await?;
        if removed.is_some() {
            tracing::debug!(%starter, "schedule disabled");
        }
        Ok(removed.map(|s| s.name))
    }

    /// Live schedules, optionally limited to one process.
    async fn schedules_of(
        &self,
        process: Option<&str>,
    ) -> Result<Vec<TimeScheduleControl>, AutoProcError> {
        let mut schedules = Vec::new();
        for starter in self.control_plane.starters().await? {
            let Ok(owner) = naming::process_from_scheduled_starter(&starter.name) else {
                continue;
            };
            if process.is_some_and(|p| p != owner) {
                continue;
            }
            schedules.push(TimeScheduleControl {
                schedule_id: naming::schedule_id_from_starter(&starter.name)?.to_string(),
                time_pattern: starter
                    .props
                    .get(props::SCHEDULE_TIME)
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                process: owner.to_string(),
                message: starter
                    .props
                    .get(props::PROCESS_MSG)
                    .cloned()
                    .unwrap_or(serde_json::Value::Null),
            });
        }
        Ok(schedules)
    }

    async fn apply_sequel(&self, sequel: &SequelControl, enabled: bool) -> Result<(), AutoProcError> {
        let starter = naming::sequel_starter_name(&sequel.precursor.name);
        let control = naming::control_name(&sequel.successor.name);
        let job = naming::control_job_name(&starter, Some(&control));

        if !enabled {
            if self.control_plane.remove_job(&job).await?.is_some() {
                tracing::debug!(%job, "sequel disabled");
            }
            return Ok(());
        }
        if self.control_plane.job(&job).await?.is_some() {
            return Ok(());
        }
        if self.control_plane.starter(&starter).await?.is_none() {
            self.control_plane
                .define_starter(StarterDef {
                    name: starter.clone(),
                    master: naming::MASTER_CHAINED_STARTER.to_string(),
                    description: sequel.description(),
                    props: Props::from([(
                        props::COMPLETED_STARTER.to_string(),
                        naming::starter_name(&sequel.precursor.name).into(),
                    )]),
                })
                .await?;
        }
        self.control_plane
            .define_job(JobDef {
                name: job.clone(),
                master: naming::master_control_job_name(&control),
                starter,
                description: sequel.description(),
                props: Props::new(),
            })
            .await?;
        tracing::debug!(%job, "sequel enabled");
        Ok(())
    }

    /// Enabled sequels, read back from the sequel control jobs.
    async fn enabled_sequels(
        &self,
        registry: &ProcessRegistry,
    ) -> Result<Vec<SequelControl>, AutoProcError> {
        let mut sequels = Vec::new();
        for job in self.control_plane.jobs().await? {
            let Ok(successor) = naming::process_from_control_job(&job.name) else {
                continue;
            };
            let precursor = naming::process_from_sequel_starter(&job.starter)?;
            match (
                registry.process_type(precursor),
                registry.process_type(successor),
            ) {
                (Ok(precursor), Ok(successor)) => sequels.push(SequelControl {
                    precursor: precursor.clone(),
                    successor: successor.clone(),
                    enabled: true,
                }),
                _ => tracing::warn!(job = %job.name, "sequel job references unknown process"),
            }
        }
        Ok(sequels)
    }

    async fn capture(&self, registry: &ProcessRegistry) -> Result<Snapshot, AutoProcError> {
        let mut captured = Snapshot {
            captured_at: Some(time::now()),
            ..Snapshot::default()
        };
        for process in registry.process_types() {
            captured.restrictions.push(RestrictionEntry {
                process: process.name.clone(),
                excludes: process.restriction.as_ref().map(ToString::to_string),
            });
            for descriptor in registry.procedures_of(&process.name) {
                let config = self.procedure_config(descriptor).await?;
                if config.enabled {
                    captured.procedures.push(ProcedureEntry {
                        name: descriptor.name.clone(),
                        result: config.has_result,
                        properties: snapshot::props_from_params(&config.params),
                    });
                }
            }
        }
        for schedule in self.schedules_of(None).await? {
            captured.schedules.push(ScheduleEntry {
                process: schedule.process,
                schedule: Some(schedule.schedule_id),
                time: Some(schedule.time_pattern),
                message: snapshot::props_from_message(&schedule.message),
            });
        }
        for sequel in self.enabled_sequels(registry).await? {
            captured.sequels.push(SequelEntry {
                process: sequel.precursor.name,
                continuation: sequel.successor.name,
            });
        }
        Ok(captured)
    }

    fn resolve(
        &self,
        registry: &ProcessRegistry,
        snapshot: &Snapshot,
    ) -> Result<ResolvedSnapshot, AutoProcError> {
        let mut resolved = ResolvedSnapshot::default();

        for entry in &snapshot.procedures {
            let descriptor = registry
                .procedure(&entry.name)
                .map_err(ConfigurationError::invalid_snapshot)?;
            let listed = resolved
                .procedures
                .entry(descriptor.process.clone())
                .or_default();
            match snapshot::params_from_props(&entry.properties) {
                Ok(params) => listed.push((descriptor.clone(), entry.result, params)),
                Err(err) => {
                    tracing::warn!(procedure = %entry.name, error = %err, "ignoring invalid procedure entry");
                }
            }
        }

        for entry in &snapshot.schedules {
            registry
                .process_type(&entry.process)
                .map_err(ConfigurationError::invalid_snapshot)?;
            let schedule = snapshot::message_from_props(&entry.message).and_then(|message| {
                TimeScheduleControl::new(
                    entry.process.as_str(),
                    entry.schedule.clone().unwrap_or_default(),
                    entry.time.clone().unwrap_or_default(),
                    message,
                )
            });
            match schedule {
                Ok(schedule) => resolved.schedules.push(schedule),
                Err(err) => {
                    tracing::warn!(process = %entry.process, error = %err, "ignoring invalid schedule entry");
                }
            }
        }

        for entry in &snapshot.sequels {
            let precursor = registry
                .process_type(&entry.process)
                .map_err(ConfigurationError::invalid_snapshot)?;
            let successor = registry
                .process_type(&entry.continuation)
                .map_err(ConfigurationError::invalid_snapshot)?;
            match SequelControl::new(precursor.clone(), successor.clone(), true) {
                Ok(sequel) => resolved.sequels.push(sequel),
                Err(err) => {
                    tracing::warn!(process = %entry.process, error = %err, "ignoring invalid sequel entry");
                }
            }
        }

        for entry in &snapshot.restrictions {
            registry
                .process_type(&entry.process)
                .map_err(ConfigurationError::invalid_snapshot)?;
            let declared = entry
                .excludes
                .as_deref()
                .filter(|excludes| !excludes.trim().is_empty());
            let restriction = match declared {
                Some(excludes) => match excludes.parse::<Restriction>() {
                    Ok(restriction) => Some(restriction),
                    Err(err) => {
                        tracing::warn!(process = %entry.process, error = %err, "ignoring invalid restriction entry");
                        continue;
                    }
                },
                None => self.bootstrap_restriction(&entry.process),
            };
            resolved.restrictions.push((entry.process.clone(), restriction));
        }
        Ok(resolved)
    }

    fn bootstrap_restriction(&self, process: &str) -> Option<Restriction> {
        self.bootstrap
            .restrictions
            .iter()
            .find(|entry| entry.process == process)
            .and_then(|entry| entry.excludes.as_deref())
            .and_then(|excludes| excludes.parse().ok())
    }

    async fn configure(
        &self,
        registry: &mut ProcessRegistry,
        snapshot: &Snapshot,
        scope: ProcedureScope,
    ) -> Result<(), AutoProcError> {
        let mut resolved = self.resolve(registry, snapshot)?;

        let processes: Vec<String> = match scope {
            ProcedureScope::Listed => resolved.procedures.keys().cloned().collect(),
            ProcedureScope::All => registry.process_types().map(|p| p.name.clone()).collect(),
        };
        for process in processes {
            for descriptor in registry.procedures_of(&process) {
                self.disable_procedure(descriptor).await?;
            }
            for (descriptor, result, params) in
                resolved.procedures.remove(&process).unwrap_or_default()
            {
                self.enable_procedure(&descriptor, result, &params).await?;
            }
        }

        for schedule in self.schedules_of(None).await? {
            self.disable_schedule(&schedule.process, &schedule.schedule_id)
                .await?;
        }
        for schedule in &resolved.schedules {
            self.enable_schedule(schedule).await?;
        }

        for job in self.control_plane.jobs().await? {
            if naming::is_sequel_control_job(&job.name) {
                self.control_plane.remove_job(&job.name).await?;
            }
        }
        for sequel in &resolved.sequels {
            self.apply_sequel(sequel, true).await?;
        }

        for (process, restriction) in resolved.restrictions {
            let process = registry.set_restriction(&process, restriction)?.clone();
            self.define_control_master(&process).await?;
        }
        Ok(())
    }
}
