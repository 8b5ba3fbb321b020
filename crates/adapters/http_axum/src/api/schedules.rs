//! JSON REST handlers for time schedules.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use autoproc_app::ports::{ControlPlane, MessageBroker, SnapshotStore};
use autoproc_domain::control::TimeScheduleControl;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for enabling a schedule.
#[derive(Deserialize)]
pub struct EnableRequest {
    /// Time pattern, stored as given.
    pub time: String,
    #[serde(default = "empty_message")]
    pub message: serde_json::Value,
}

fn empty_message() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Response body of an enabled schedule.
#[derive(Serialize)]
pub struct EnabledBody {
    pub starter: String,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<TimeScheduleControl>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the enable endpoint.
pub enum EnableResponse {
    Ok(Json<EnabledBody>),
}

impl IntoResponse for EnableResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the disable endpoint.
pub enum DisableResponse {
    NoContent,
}

impl IntoResponse for DisableResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Possible responses from the run endpoint.
pub enum RunResponse {
    Accepted,
}

impl IntoResponse for RunResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// `GET /api/processes/{name}/schedules` — active schedules of a process.
pub async fn list<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path(name): Path<String>,
) -> Result<ListResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let schedules = state.automation.schedules(&name).await?;
    Ok(ListResponse::Ok(Json(schedules)))
}

/// `PUT /api/processes/{name}/schedules/{id}` — enable or replace a schedule.
pub async fn enable<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path((name, id)): Path<(String, String)>,
    Json(req): Json<EnableRequest>,
) -> Result<EnableResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let starter = state
        .automation
        .set_schedule(&name, &id, &req.time, req.message, true)
        .await?
        .unwrap_or_default();
    Ok(EnableResponse::Ok(Json(EnabledBody { starter })))
}

/// `DELETE /api/processes/{name}/schedules/{id}` — disable a schedule.
pub async fn disable<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<DisableResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    state
        .automation
        .set_schedule(&name, &id, "", serde_json::Value::Null, false)
        .await?;
    Ok(DisableResponse::NoContent)
}

/// `POST /api/processes/{name}/schedules/{id}/run` — activate a schedule now.
pub async fn run<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<RunResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    state.automation.run_schedule_now(&name, &id).await?;
    Ok(RunResponse::Accepted)
}
