//! JSON REST handlers for process types and their execution.

use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use autoproc_app::ports::{ControlPlane, MessageBroker, SnapshotStore};
use autoproc_domain::procedure::ProcedureConfig;
use autoproc_domain::process::ProcessType;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for replacing a restriction.
#[derive(Deserialize)]
pub struct RestrictionRequest {
    /// Comma-separated state tokens; missing or blank clears the restriction.
    pub excludes: Option<String>,
}

/// Request body for executing a process.
#[derive(Deserialize)]
pub struct ExecuteRequest {
    #[serde(default = "empty_message")]
    pub message: serde_json::Value,
    /// Overrides the default execution timeout.
    pub timeout_ms: Option<u64>,
}

fn empty_message() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Response body of a successful execution.
#[derive(Serialize)]
pub struct ExecuteBody {
    pub result: serde_json::Value,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<ProcessType>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and restriction endpoints.
pub enum GetResponse {
    Ok(Json<ProcessType>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the procedures endpoint.
pub enum ProceduresResponse {
    Ok(Json<Vec<ProcedureConfig>>),
}

impl IntoResponse for ProceduresResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the execute endpoint.
pub enum ExecuteResponse {
    Ok(Json<ExecuteBody>),
}

impl IntoResponse for ExecuteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/processes` — list all process types.
pub async fn list<CP, SS, B>(State(state): State<AppState<CP, SS, B>>) -> ListResponse
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    ListResponse::Ok(Json(state.automation.process_types().await))
}

/// `GET /api/processes/{name}` — get a process type by name.
pub async fn get<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path(name): Path<String>,
) -> Result<GetResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let process = state.automation.process_type(&name).await?;
    Ok(GetResponse::Ok(Json(process)))
}

/// `GET /api/processes/{name}/procedures` — every procedure with its live configuration.
pub async fn procedures<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path(name): Path<String>,
) -> Result<ProceduresResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let procedures = state.automation.procedures(&name).await?;
    Ok(ProceduresResponse::Ok(Json(procedures)))
}

/// `PUT /api/processes/{name}/restriction` — replace the restriction.
pub async fn set_restriction<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path(name): Path<String>,
    Json(req): Json<RestrictionRequest>,
) -> Result<GetResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let process = state
        .automation
        .set_restriction(&name, req.excludes.as_deref())
        .await?;
    Ok(GetResponse::Ok(Json(process)))
}

/// `POST /api/processes/{name}/execute` — run the process and return its result.
pub async fn execute<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path(name): Path<String>,
    Json(req): Json<ExecuteRequest>,
) -> Result<ExecuteResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let result = state
        .automation
        .execute(&name, req.message, req.timeout_ms.map(Duration::from_millis))
        .await?;
    Ok(ExecuteResponse::Ok(Json(ExecuteBody { result })))
}
