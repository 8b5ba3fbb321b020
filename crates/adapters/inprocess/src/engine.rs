//! Object store and dispatcher shared by the control plane and broker impls.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use autoproc_app::config_controller::PROCESS_CONTROL_IMPL;
use autoproc_app::ports::{JobDef, MasterDef, StarterDef};
use autoproc_domain::error::ExecutionError;
use autoproc_domain::id::ExecutionId;
use autoproc_domain::naming::{self, props};
use autoproc_domain::outcome::{self, Completion, ProcedureOutcome};
use autoproc_domain::param::{ParamValue, Params};
use autoproc_domain::restriction::{Restriction, StatefulMessage};
use serde_json::Value;

use crate::error::EngineError;

/// Procedure implementation: receives the process message and the job
/// parameters, returns the procedure result or a failure message.
pub type ProcedureFn = dyn Fn(&Value, &Params) -> Result<Value, String> + Send + Sync;

/// Maximum number of sequel hops following one process run.
pub const MAX_SEQUEL_DEPTH: usize = 16;

const FAILURE_HISTORY: usize = 64;

#[derive(Debug, Default)]
pub(crate) struct Objects {
    pub master_starters: BTreeMap<String, MasterDef>,
    pub master_jobs: BTreeMap<String, MasterDef>,
    pub starters: BTreeMap<String, StarterDef>,
    pub jobs: BTreeMap<String, JobDef>,
}

#[derive(Default)]
struct Inner {
    objects: Mutex<Objects>,
    procedures: RwLock<HashMap<String, Arc<ProcedureFn>>>,
    generation: AtomicU64,
    failures: Mutex<VecDeque<ExecutionError>>,
}

/// In-memory job-control engine.
///
/// Cheap to clone; every clone shares the same objects and procedures.
#[derive(Clone, Default)]
pub struct InProcessEngine {
    inner: Arc<Inner>,
}

impl InProcessEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the closure run by master jobs with this `implementation`.
    pub fn register_procedure<F>(&self, implementation: impl Into<String>, handler: F)
    where
        F: Fn(&Value, &Params) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.inner
            .procedures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(implementation.into(), Arc::new(handler));
    }

    /// Number of restarts since creation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn restarted(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn objects(&self) -> MutexGuard<'_, Objects> {
        self.inner
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Name of the message starter subscribed to `topic`.
    pub(crate) fn subscriber(&self, topic: &str) -> Option<String> {
        self.objects()
            .starters
            .values()
            .find(|s| s.props.get(props::MSG_SUBJECT).and_then(Value::as_str) == Some(topic))
            .map(|s| s.name.clone())
    }

    /// Run every procedure job of `process`, then fire its sequels.
    pub(crate) fn run_process(
        &self,
        process: &str,
        message: &Value,
        execution_id: ExecutionId,
    ) -> Completion {
        self.dispatch(process, message, execution_id, 0)
    }

    fn dispatch(
        &self,
        process: &str,
        message: &Value,
        execution_id: ExecutionId,
        depth: usize,
    ) -> Completion {
        let outcomes = self.fire(&naming::starter_name(process), message, depth);
        let completion = Completion::new(execution_id, outcomes);
        tracing::debug!(
            %process,
            %execution_id,
            outcomes = completion.outcomes.len(),
            "process ran"
        );
        self.chain(process, &completion, depth);
        completion
    }

    /// Activate starter `name` with the message it carries.
    pub(crate) fn activate(&self, name: &str) -> Result<(), EngineError> {
        let starter = self
            .objects()
            .starters
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownStarter {
                name: name.to_string(),
            })?;
        let message = starter
            .props
            .get(props::PROCESS_MSG)
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

        if starter.master == naming::MASTER_PROCESS_STARTER
            && let Ok(process) = naming::process_from_starter(name)
        {
            let control = naming::master_control_job_name(&naming::control_name(process));
            let master = self.objects().master_jobs.get(&control).cloned();
            self.run_unattended(process, master.as_ref(), &message, 0);
            return Ok(());
        }
        tracing::info!(starter = %name, "starter activated");
        self.fire(name, &message, 0);
        Ok(())
    }

    /// Failures of scheduled and chained runs, oldest first.
    #[must_use]
    pub fn recent_failures(&self) -> Vec<ExecutionError> {
        self.inner
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Run a process nobody waits on, honoring the restriction carried by
    /// its master control job.
    fn run_unattended(
        &self,
        process: &str,
        master: Option<&MasterDef>,
        message: &Value,
        depth: usize,
    ) {
        if let Some(excludes) = master
            .and_then(|m| m.props.get(props::PROCESS_RESTRICTION))
            .and_then(Value::as_str)
        {
            match excludes.parse::<Restriction>() {
                Ok(restriction) if restriction.restricts(message) => {
                    tracing::warn!(
                        %process,
                        state = message.state_ctx().unwrap_or_default(),
                        "restricted process not started"
                    );
                    return;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        %process,
                        error = %err,
                        "unreadable restriction, process not started"
                    );
                    return;
                }
            }
        }

        let execution_id = ExecutionId::new();
        let completion = self.dispatch(process, message, execution_id, depth);
        match outcome::aggregate(process, &completion) {
            Ok(_) | Err(ExecutionError::NoResult { .. }) => {}
            Err(err) => {
                if let ExecutionError::Aggregate { failures, .. } = &err {
                    for failure in failures {
                        tracing::error!(%process, %execution_id, "{failure}");
                    }
                }
                let mut history = self
                    .inner
                    .failures
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if history.len() == FAILURE_HISTORY {
                    history.pop_front();
                }
                history.push_back(err);
            }
        }
    }

    /// Run the jobs bound to `starter`; control jobs run their whole process.
    fn fire(&self, starter: &str, message: &Value, depth: usize) -> Vec<ProcedureOutcome> {
        let bound: Vec<(JobDef, Option<MasterDef>)> = {
            let objects = self.objects();
            objects
                .jobs
                .values()
                .filter(|job| job.starter == starter)
                .map(|job| (job.clone(), objects.master_jobs.get(&job.master).cloned()))
                .collect()
        };

        let mut outcomes = Vec::new();
        for (job, master) in bound {
            let Some(master) = master else {
                outcomes.push(ProcedureOutcome::Failed {
                    message: EngineError::UnknownMaster {
                        kind: "job",
                        name: job.master.clone(),
                    }
                    .to_string(),
                    procedure: job.master,
                });
                continue;
            };
            if master.implementation == PROCESS_CONTROL_IMPL {
                match master.props.get(props::PROCESS_TYPE).and_then(Value::as_str) {
                    Some(process) => self.run_unattended(process, Some(&master), message, depth),
                    None => tracing::warn!(job = %job.name, "control job without process type"),
                }
                continue;
            }
            outcomes.push(self.run_procedure(&job, &master, message));
        }
        outcomes
    }

    fn run_procedure(&self, job: &JobDef, master: &MasterDef, message: &Value) -> ProcedureOutcome {
        let procedure = job.master.clone();
        let handler = self
            .inner
            .procedures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&master.implementation)
            .cloned();
        let Some(handler) = handler else {
            return ProcedureOutcome::Failed {
                procedure,
                message: format!("no procedure implementation {}", master.implementation),
            };
        };

        let no_result = job
            .props
            .get(props::NO_RESULT)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let params: Params = job
            .props
            .iter()
            .filter(|(key, _)| key.as_str() != props::NO_RESULT)
            .map(|(key, value)| (key.clone(), ParamValue::from_json(value)))
            .collect();

        match handler(message, &params) {
            Ok(result) => ProcedureOutcome::Succeeded {
                procedure,
                result: (!no_result).then_some(result),
            },
            Err(message) => ProcedureOutcome::Failed { procedure, message },
        }
    }

    /// Activate the sequel starters waiting on `process` with its result.
    ///
    /// Sequels run on spawned tasks. A task spawned before a restart is
    /// dropped, and a chain stops after [`MAX_SEQUEL_DEPTH`] hops so that
    /// cyclic sequels cannot run forever.
    fn chain(&self, process: &str, completion: &Completion, depth: usize) {
        let completed = naming::starter_name(process);
        let chained: Vec<String> = self
            .objects()
            .starters
            .values()
            .filter(|s| {
                s.props.get(props::COMPLETED_STARTER).and_then(Value::as_str)
                    == Some(completed.as_str())
            })
            .map(|s| s.name.clone())
            .collect();
        if chained.is_empty() {
            return;
        }
        if depth >= MAX_SEQUEL_DEPTH {
            tracing::warn!(%process, depth, "sequel chain too deep, sequels skipped");
            return;
        }

        let result = match outcome::aggregate(process, completion) {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(%process, error = %err, "sequels skipped");
                return;
            }
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(%process, "no async runtime, sequels skipped");
            return;
        };
        let generation = self.generation();
        for starter in chained {
            let engine = self.clone();
            let message = result.clone();
            runtime.spawn(async move {
                if engine.generation() != generation {
                    tracing::debug!(%starter, "sequel dropped by restart");
                    return;
                }
                engine.fire(&starter, &message, depth + 1);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoproc_app::ports::{ControlPlane, ExecutionRequest, MessageBroker, Props};
    use autoproc_domain::error::AutoProcError;
    use serde_json::json;

    fn master(name: &str, implementation: &str, props: Props) -> MasterDef {
        MasterDef {
            name: name.to_string(),
            description: String::new(),
            implementation: implementation.to_string(),
            props,
        }
    }

    fn starter(name: &str, master: &str, props: Props) -> StarterDef {
        StarterDef {
            name: name.to_string(),
            master: master.to_string(),
            description: String::new(),
            props,
        }
    }

    fn job(name: &str, master: &str, starter: &str, props: Props) -> JobDef {
        JobDef {
            name: name.to_string(),
            master: master.to_string(),
            starter: starter.to_string(),
            description: String::new(),
            props,
        }
    }

    /// Engine wired with process `Tst` running procedures `A` and `B`.
    async fn engine() -> InProcessEngine {
        let engine = InProcessEngine::new();
        engine.register_procedure("echo", |message, _| Ok(message.clone()));
        engine.register_procedure("double", |message, params| {
            let factor = match params.get("factor") {
                Some(ParamValue::Integer(f)) => *f,
                _ => 2,
            };
            message["n"]
                .as_i64()
                .map(|n| json!(n * factor))
                .ok_or_else(|| "'java.lang.IllegalStateException' n missing\n\tat Double".to_string())
        });

        for name in [
            naming::MASTER_PROCESS_STARTER,
            naming::MASTER_CHAINED_STARTER,
            naming::MASTER_SCHEDULE_STARTER,
        ] {
            engine
                .define_master_starter(master(name, "starter", Props::new()))
                .await
                .unwrap();
        }
        for process in ["Tst", "Log"] {
            engine
                .define_master_job(master(
                    &naming::master_control_job_name(&naming::control_name(process)),
                    PROCESS_CONTROL_IMPL,
                    Props::from([(props::PROCESS_TYPE.to_string(), json!(process))]),
                ))
                .await
                .unwrap();
            engine
                .define_starter(starter(
                    &naming::starter_name(process),
                    naming::MASTER_PROCESS_STARTER,
                    Props::from([(props::MSG_SUBJECT.to_string(), json!(naming::topic(process)))]),
                ))
                .await
                .unwrap();
        }
        engine
            .define_master_job(master("A", "echo", Props::new()))
            .await
            .unwrap();
        engine
            .define_master_job(master("B", "double", Props::new()))
            .await
            .unwrap();
        engine
            .define_job(job(
                "Tst-=>A",
                "A",
                "Tst-Starter",
                Props::from([(props::NO_RESULT.to_string(), json!(true))]),
            ))
            .await
            .unwrap();
        engine
            .define_job(job("Tst-=>B", "B", "Tst-Starter", Props::new()))
            .await
            .unwrap();
        engine
    }

    fn request(message: Value) -> ExecutionRequest {
        ExecutionRequest {
            execution_id: ExecutionId::new(),
            source: "test".to_string(),
            message,
        }
    }

    #[tokio::test]
    async fn should_run_procedure_jobs_of_subscribed_starter() {
        let engine = engine().await;
        let completion = engine
            .publish_request("Prcs.Tst", request(json!({ "n": 4 })))
            .await
            .unwrap();

        assert_eq!(completion.outcomes.len(), 2);
        assert_eq!(
            completion.outcomes[0],
            ProcedureOutcome::Succeeded {
                procedure: "A".to_string(),
                result: None,
            }
        );
        assert_eq!(completion.results().collect::<Vec<_>>(), vec![&json!(8)]);
    }

    #[tokio::test]
    async fn should_pass_job_params_to_procedure() {
        let engine = engine().await;
        engine
            .define_job(job(
                "Tst-=>B",
                "B",
                "Tst-Starter",
                Props::from([("factor".to_string(), json!(10))]),
            ))
            .await
            .unwrap();
        let completion = engine
            .publish_request("Prcs.Tst", request(json!({ "n": 4 })))
            .await
            .unwrap();
        assert_eq!(outcome::aggregate("Tst", &completion).unwrap(), json!(40));
    }

    #[tokio::test]
    async fn should_report_failed_procedure() {
        let engine = engine().await;
        let completion = engine
            .publish_request("Prcs.Tst", request(json!({})))
            .await
            .unwrap();
        match outcome::aggregate("Tst", &completion) {
            Err(autoproc_domain::error::ExecutionError::Aggregate { failures, .. }) => {
                assert_eq!(failures, vec!["Procedure B of Tst has failed: n missing"]);
            }
            other => panic!("expected aggregate failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_fail_job_without_implementation() {
        let engine = engine().await;
        engine
            .define_master_job(master("Ghost", "missing", Props::new()))
            .await
            .unwrap();
        engine
            .define_job(job("Tst-=>Ghost", "Ghost", "Tst-Starter", Props::new()))
            .await
            .unwrap();
        let completion = engine
            .publish_request("Prcs.Tst", request(json!({ "n": 1 })))
            .await
            .unwrap();
        assert!(completion.outcomes.iter().any(|o| matches!(
            o,
            ProcedureOutcome::Failed { procedure, .. } if procedure == "Ghost"
        )));
    }

    #[tokio::test]
    async fn should_reject_topic_without_subscriber() {
        let engine = engine().await;
        let result = engine.publish_request("Prcs.Nobody", request(json!({}))).await;
        assert!(matches!(result, Err(AutoProcError::Messaging(_))));
    }

    #[tokio::test]
    async fn should_reject_job_of_unknown_master() {
        let engine = engine().await;
        let result = engine
            .define_job(job("Tst-=>X", "X", "Tst-Starter", Props::new()))
            .await;
        assert!(matches!(result, Err(AutoProcError::ControlPlane(_))));
    }

    #[tokio::test]
    async fn should_run_process_when_schedule_is_activated() {
        let engine = engine().await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        engine
            .define_master_job(master("Note", "note", Props::new()))
            .await
            .unwrap();
        engine.register_procedure("note", move |message, _| {
            recorder.lock().unwrap().push(message.clone());
            Ok(Value::Null)
        });
        engine
            .define_job(job("Log-=>Note", "Note", "Log-Starter", Props::new()))
            .await
            .unwrap();
        engine
            .define_starter(starter(
                "Log@nightly-Schedule",
                naming::MASTER_SCHEDULE_STARTER,
                Props::from([(props::PROCESS_MSG.to_string(), json!({ "batch": 1 }))]),
            ))
            .await
            .unwrap();
        engine
            .define_job(job(
                "Log@nightly-Schedule:AutoJob",
                "Log-Cntrl:MasterAutoJob",
                "Log@nightly-Schedule",
                Props::new(),
            ))
            .await
            .unwrap();

        engine.activate_starter("Log@nightly-Schedule").await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![json!({ "batch": 1 })]);

        let missing = engine.activate_starter("Log@weekly-Schedule").await;
        assert!(matches!(missing, Err(AutoProcError::ControlPlane(_))));
    }

    #[tokio::test]
    async fn should_run_sequel_with_precursor_result() {
        let engine = engine().await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        engine
            .define_master_job(master("Note", "note", Props::new()))
            .await
            .unwrap();
        engine.register_procedure("note", move |message, _| {
            recorder.lock().unwrap().push(message.clone());
            Ok(Value::Null)
        });
        engine
            .define_job(job("Log-=>Note", "Note", "Log-Starter", Props::new()))
            .await
            .unwrap();
        engine
            .define_starter(starter(
                "Tst-Sequel",
                naming::MASTER_CHAINED_STARTER,
                Props::from([(props::COMPLETED_STARTER.to_string(), json!("Tst-Starter"))]),
            ))
            .await
            .unwrap();
        engine
            .define_job(job(
                "Tst-Sequel>Log-Cntrl:AutoJob",
                "Log-Cntrl:MasterAutoJob",
                "Tst-Sequel",
                Props::new(),
            ))
            .await
            .unwrap();

        engine
            .publish_request("Prcs.Tst", request(json!({ "n": 3 })))
            .await
            .unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(*seen.lock().unwrap(), vec![json!(6)]);
    }

    /// Bind a recording `Note` procedure to process `Log`, returning its log.
    async fn record_log(engine: &InProcessEngine) -> Arc<Mutex<Vec<Value>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        engine
            .define_master_job(master("Note", "note", Props::new()))
            .await
            .unwrap();
        engine.register_procedure("note", move |message, _| {
            let mut seen = recorder.lock().unwrap();
            seen.push(message.clone());
            Ok(json!(seen.len()))
        });
        engine
            .define_job(job("Log-=>Note", "Note", "Log-Starter", Props::new()))
            .await
            .unwrap();
        seen
    }

    async fn chain_to_log(engine: &InProcessEngine, precursor: &str) {
        let sequel = naming::sequel_starter_name(precursor);
        engine
            .define_starter(starter(
                &sequel,
                naming::MASTER_CHAINED_STARTER,
                Props::from([(
                    props::COMPLETED_STARTER.to_string(),
                    json!(naming::starter_name(precursor)),
                )]),
            ))
            .await
            .unwrap();
        engine
            .define_job(job(
                &naming::control_job_name(&sequel, Some("Log-Cntrl")),
                "Log-Cntrl:MasterAutoJob",
                &sequel,
                Props::new(),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn should_drop_pending_sequel_when_restarted() {
        let engine = engine().await;
        let seen = record_log(&engine).await;
        chain_to_log(&engine, "Tst").await;

        engine
            .publish_request("Prcs.Tst", request(json!({ "n": 3 })))
            .await
            .unwrap();
        engine.restart().await.unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_stop_cyclic_sequel_chain() {
        let engine = engine().await;
        let seen = record_log(&engine).await;
        chain_to_log(&engine, "Log").await;

        engine
            .publish_request("Prcs.Log", request(json!("start")))
            .await
            .unwrap();
        for _ in 0..200 {
            tokio::task::yield_now().await;
        }
        assert_eq!(seen.lock().unwrap().len(), MAX_SEQUEL_DEPTH + 1);
    }

    #[tokio::test]
    async fn should_skip_restricted_scheduled_run() {
        let engine = engine().await;
        let seen = record_log(&engine).await;
        engine
            .define_master_job(master(
                "Log-Cntrl:MasterAutoJob",
                PROCESS_CONTROL_IMPL,
                Props::from([
                    (props::PROCESS_TYPE.to_string(), json!("Log")),
                    (props::PROCESS_RESTRICTION.to_string(), json!("closed")),
                ]),
            ))
            .await
            .unwrap();
        for (id, state) in [("late", "closed"), ("early", "open")] {
            let schedule = naming::scheduled_starter_name("Log", id);
            engine
                .define_starter(starter(
                    &schedule,
                    naming::MASTER_SCHEDULE_STARTER,
                    Props::from([(
                        props::PROCESS_MSG.to_string(),
                        json!({ "state_ctx": state }),
                    )]),
                ))
                .await
                .unwrap();
            engine
                .define_job(job(
                    &naming::control_job_name(&schedule, None),
                    "Log-Cntrl:MasterAutoJob",
                    &schedule,
                    Props::new(),
                ))
                .await
                .unwrap();
            engine.activate_starter(&schedule).await.unwrap();
        }

        assert_eq!(*seen.lock().unwrap(), vec![json!({ "state_ctx": "open" })]);
    }

    #[tokio::test]
    async fn should_record_failure_of_unattended_run() {
        let engine = engine().await;
        engine
            .define_master_job(master("Fail", "fail", Props::new()))
            .await
            .unwrap();
        engine.register_procedure("fail", |_, _| Err("disk full".to_string()));
        engine
            .define_job(job("Log-=>Fail", "Fail", "Log-Starter", Props::new()))
            .await
            .unwrap();
        chain_to_log(&engine, "Tst").await;

        engine
            .publish_request("Prcs.Tst", request(json!({ "n": 1 })))
            .await
            .unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let failures = engine.recent_failures();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            &failures[0],
            ExecutionError::Aggregate { process, .. } if process == "Log"
        ));
    }

    #[tokio::test]
    async fn should_bump_generation_on_restart() {
        let engine = engine().await;
        assert_eq!(engine.generation(), 0);
        engine.restart().await.unwrap();
        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.jobs().await.unwrap().len(), 2);
    }
}
