//! End-to-end smoke tests for the full autoprocd stack.
//!
//! Each test wires the in-process engine, a JSON snapshot file in the temp
//! directory, the real services and the real axum router, then exercises the
//! HTTP layer via `tower::ServiceExt::oneshot`. No TCP port is bound.

use std::path::PathBuf;
use std::time::Duration;

use autoproc_adapter_http_axum::router;
use autoproc_adapter_http_axum::state::AppState;
use autoproc_adapter_inprocess::InProcessEngine;
use autoproc_adapter_snapshot_json::JsonFileSnapshotStore;
use autoproc_app::config_controller::AutomationConfigController;
use autoproc_app::registry::ProcessRegistry;
use autoproc_app::services::process_automation::ProcessAutomation;
use autoproc_domain::procedure::{ProcedureDescriptor, ProcedureRole};
use autoproc_domain::process::ProcessType;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn snapshot_path() -> PathBuf {
    std::env::temp_dir().join(format!("autoprocd-{}.json", uuid::Uuid::new_v4()))
}

/// Build a fully-wired router around a `Tst` process with procedures `A`
/// (enabled, no result) and `B` (enabled, returns the result).
async fn app(path: PathBuf) -> axum::Router {
    let engine = InProcessEngine::new();
    engine.register_procedure("label-a", |_, _| Ok(json!("A")));
    engine.register_procedure("label-b", |_, _| Ok(json!("B")));

    let registry = ProcessRegistry::builder()
        .register_process_type(
            ProcessType::builder()
                .name("Tst")
                .msg_kind("Order")
                .result_kind("Label")
                .build()
                .expect("process type should be valid"),
        )
        .register_procedure(
            ProcedureDescriptor::new("A", "Tst", "label-a").with_role(ProcedureRole::Default),
        )
        .register_procedure(
            ProcedureDescriptor::new("B", "Tst", "label-b").with_role(ProcedureRole::Result),
        )
        .build()
        .expect("registry should build");

    let controller = AutomationConfigController::bootstrap(
        registry,
        engine.clone(),
        JsonFileSnapshotStore::new(path),
    )
    .await
    .expect("bootstrap should succeed");

    let automation = ProcessAutomation::new(controller, engine, Duration::from_secs(2));
    router::build(AppState::new(automation))
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn execute(app: &axum::Router, message: Value) -> axum::response::Response {
    app.clone()
        .oneshot(request(
            "POST",
            "/api/processes/Tst/execute",
            Some(json!({ "message": message })),
        ))
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let resp = app(snapshot_path())
        .await
        .oneshot(request("GET", "/health", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_result_of_result_procedure() {
    let app = app(snapshot_path()).await;

    let resp = execute(&app, json!({})).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!({ "result": "B" }));
}

#[tokio::test]
async fn should_return_not_found_when_executing_unknown_process() {
    let resp = app(snapshot_path())
        .await
        .oneshot(request(
            "POST",
            "/api/processes/Ghost/execute",
            Some(json!({})),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_reject_restricted_message_state() {
    let app = app(snapshot_path()).await;

    let resp = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/processes/Tst/restriction",
            Some(json!({ "excludes": "closed, archived" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = execute(&app, json!({ "state_ctx": "closed" })).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = execute(&app, json!({ "state_ctx": "open" })).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_flip_result_procedure_and_restore_it_on_reset() {
    let app = app(snapshot_path()).await;

    for (name, result) in [("A", true), ("B", false)] {
        let resp = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/api/procedures/{name}"),
                Some(json!({ "enabled": true, "result": result })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["has_result"], json!(result));
    }
    assert_eq!(
        json_body(execute(&app, json!({})).await).await,
        json!({ "result": "A" })
    );

    let resp = app
        .clone()
        .oneshot(request("POST", "/api/configuration/reset", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        json_body(execute(&app, json!({})).await).await,
        json!({ "result": "B" })
    );
}

#[tokio::test]
async fn should_list_procedures_of_process() {
    let resp = app(snapshot_path())
        .await
        .oneshot(request("GET", "/api/processes/Tst/procedures", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    let procedures = body.as_array().unwrap();
    assert_eq!(procedures.len(), 2);
    assert!(procedures.iter().all(|p| p["enabled"] == json!(true)));
}

#[tokio::test]
async fn should_persist_configuration_when_stored() {
    let path = snapshot_path();
    let app = app(path.clone()).await;

    let resp = app
        .clone()
        .oneshot(request("POST", "/api/configuration/store", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let stored = json_body(resp).await;
    assert_eq!(stored["procedures"].as_array().unwrap().len(), 2);

    let persisted: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(persisted["procedures"], stored["procedures"]);

    let resp = app
        .oneshot(request("POST", "/api/configuration/reset", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(!path.exists());
}

#[tokio::test]
async fn should_reject_snapshot_naming_unknown_procedure() {
    let resp = app(snapshot_path())
        .await
        .oneshot(request(
            "PUT",
            "/api/configuration",
            Some(json!({
                "restrictions": [],
                "procedures": [{ "name": "Ghost", "result": true }],
                "schedules": [],
                "sequels": [],
            })),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
