//! Process automation running against the in-process engine.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use autoproc_adapter_inprocess::InProcessEngine;
use autoproc_app::config_controller::AutomationConfigController;
use autoproc_app::ports::SnapshotStore;
use autoproc_app::registry::ProcessRegistry;
use autoproc_app::services::process_automation::ProcessAutomation;
use autoproc_domain::error::{AutoProcError, ExecutionError};
use autoproc_domain::param::Params;
use autoproc_domain::procedure::{ProcedureDescriptor, ProcedureRole};
use autoproc_domain::process::ProcessType;
use autoproc_domain::snapshot::Snapshot;
use serde_json::{Value, json};

#[derive(Default)]
struct MemoryStore(Mutex<Option<Snapshot>>);

impl SnapshotStore for MemoryStore {
    async fn load(&self) -> Result<Option<Snapshot>, AutoProcError> {
        Ok(self.0.lock().unwrap().clone())
    }
    async fn save(&self, snapshot: &Snapshot) -> Result<(), AutoProcError> {
        *self.0.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }
    async fn purge(&self) -> Result<(), AutoProcError> {
        *self.0.lock().unwrap() = None;
        Ok(())
    }
}

type Automation = ProcessAutomation<InProcessEngine, MemoryStore, InProcessEngine>;

async fn automation(audit: Arc<Mutex<Vec<Value>>>) -> (Automation, InProcessEngine) {
    let engine = InProcessEngine::new();
    engine.register_procedure("label-a", |_, _| Ok(json!("A")));
    engine.register_procedure("label-b", |_, _| Ok(json!("B")));
    engine.register_procedure("audit", move |message, _| {
        audit.lock().unwrap().push(message.clone());
        Ok(Value::Null)
    });
    engine.register_procedure("close", |_, _| Ok(json!({ "state_ctx": "closed" })));
    engine.register_procedure("boom", |_, _| Err("audit store offline".to_string()));

    let registry = ProcessRegistry::builder()
        .register_process_type(
            ProcessType::builder()
                .name("Tst")
                .msg_kind("Order")
                .result_kind("Label")
                .build()
                .unwrap(),
        )
        .register_process_type(
            ProcessType::builder()
                .name("Audit")
                .msg_kind("Label")
                .result_kind("Label")
                .build()
                .unwrap(),
        )
        .register_process_type(
            ProcessType::builder()
                .name("Close")
                .msg_kind("Order")
                .result_kind("Label")
                .build()
                .unwrap(),
        )
        .register_procedure(
            ProcedureDescriptor::new("A", "Tst", "label-a").with_role(ProcedureRole::Default),
        )
        .register_procedure(
            ProcedureDescriptor::new("B", "Tst", "label-b").with_role(ProcedureRole::Result),
        )
        .register_procedure(
            ProcedureDescriptor::new("Record", "Audit", "audit").with_role(ProcedureRole::Result),
        )
        .register_procedure(ProcedureDescriptor::new("Closer", "Close", "close"))
        .register_procedure(ProcedureDescriptor::new("Boom", "Audit", "boom"))
        .build()
        .unwrap();

    let config = AutomationConfigController::bootstrap(registry, engine.clone(), MemoryStore::default())
        .await
        .unwrap();
    (
        ProcessAutomation::new(config, engine.clone(), Duration::from_secs(1)),
        engine,
    )
}

#[tokio::test]
async fn should_return_result_of_result_procedure() {
    let (automation, _) = automation(Arc::default()).await;
    let result = automation.execute("Tst", json!({}), None).await.unwrap();
    assert_eq!(result, json!("B"));
}

#[tokio::test]
async fn should_follow_result_flip_and_reset() {
    let (automation, engine) = automation(Arc::default()).await;

    automation
        .set_procedure_status("A", true, true, Params::new())
        .await
        .unwrap();
    automation
        .set_procedure_status("B", true, false, Params::new())
        .await
        .unwrap();
    assert_eq!(
        automation.execute("Tst", json!({}), None).await.unwrap(),
        json!("A")
    );

    automation.reset().await.unwrap();
    assert_eq!(
        automation.execute("Tst", json!({}), None).await.unwrap(),
        json!("B")
    );
    assert_eq!(engine.generation(), 1);
}

#[tokio::test]
async fn should_report_no_result_when_result_procedure_disabled() {
    let (automation, _) = automation(Arc::default()).await;
    automation
        .set_procedure_status("B", false, false, Params::new())
        .await
        .unwrap();
    let result = automation.execute("Tst", json!({}), None).await;
    assert!(matches!(
        result,
        Err(AutoProcError::Execution(ExecutionError::NoResult { .. }))
    ));
}

#[tokio::test]
async fn should_run_sequel_after_precursor_completes() {
    let audit = Arc::new(Mutex::new(Vec::new()));
    let (automation, _) = automation(Arc::clone(&audit)).await;
    automation.set_sequel("Tst", "Audit", true).await.unwrap();

    automation.execute("Tst", json!({}), None).await.unwrap();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(*audit.lock().unwrap(), vec![json!("B")]);
}

#[tokio::test]
async fn should_run_scheduled_process_on_demand() {
    let audit = Arc::new(Mutex::new(Vec::new()));
    let (automation, _) = automation(Arc::clone(&audit)).await;
    automation
        .set_schedule("Audit", "hourly", "0 0 * * * *", json!({ "from": "schedule" }), true)
        .await
        .unwrap();

    automation.run_schedule_now("Audit", "hourly").await.unwrap();
    assert_eq!(*audit.lock().unwrap(), vec![json!({ "from": "schedule" })]);
}

#[tokio::test]
async fn should_not_start_restricted_process_from_sequel_or_schedule() {
    let audit = Arc::new(Mutex::new(Vec::new()));
    let (automation, _) = automation(Arc::clone(&audit)).await;
    automation
        .set_restriction("Audit", Some("closed"))
        .await
        .unwrap();

    let refused = automation
        .execute("Audit", json!({ "state_ctx": "closed" }), None)
        .await;
    assert!(matches!(refused, Err(AutoProcError::RestrictionViolation(_))));

    automation
        .set_procedure_status("Closer", true, true, Params::new())
        .await
        .unwrap();
    automation.set_sequel("Close", "Audit", true).await.unwrap();
    let closed = automation.execute("Close", json!({}), None).await.unwrap();
    assert_eq!(closed, json!({ "state_ctx": "closed" }));
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(audit.lock().unwrap().is_empty());

    automation
        .set_schedule("Audit", "hourly", "0 0 * * * *", json!({ "state_ctx": "closed" }), true)
        .await
        .unwrap();
    automation.run_schedule_now("Audit", "hourly").await.unwrap();
    assert!(audit.lock().unwrap().is_empty());

    automation.set_restriction("Audit", None).await.unwrap();
    automation.run_schedule_now("Audit", "hourly").await.unwrap();
    assert_eq!(*audit.lock().unwrap(), vec![json!({ "state_ctx": "closed" })]);
}

#[tokio::test]
async fn should_keep_restriction_of_loaded_snapshot_for_scheduled_runs() {
    let audit = Arc::new(Mutex::new(Vec::new()));
    let (automation, _) = automation(Arc::clone(&audit)).await;
    automation
        .set_schedule("Audit", "hourly", "0 0 * * * *", json!({ "state_ctx": "closed" }), true)
        .await
        .unwrap();
    let mut snapshot = automation.snapshot().await.unwrap();
    for entry in &mut snapshot.restrictions {
        if entry.process == "Audit" {
            entry.excludes = Some("closed".to_string());
        }
    }

    automation.load(&snapshot).await.unwrap();
    automation.run_schedule_now("Audit", "hourly").await.unwrap();
    assert!(audit.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_record_failure_of_scheduled_run() {
    let (automation, engine) = automation(Arc::default()).await;
    automation
        .set_procedure_status("Boom", true, false, Params::new())
        .await
        .unwrap();
    automation
        .set_schedule("Audit", "hourly", "0 0 * * * *", json!({}), true)
        .await
        .unwrap();

    automation.run_schedule_now("Audit", "hourly").await.unwrap();

    let failures = engine.recent_failures();
    assert_eq!(failures.len(), 1);
    match &failures[0] {
        ExecutionError::Aggregate { failures, .. } => assert_eq!(
            failures,
            &vec!["Procedure Boom of Audit has failed: audit store offline".to_string()]
        ),
        other => panic!("expected aggregate failure, got {other:?}"),
    }
}
