//! JSON REST handlers for sequels.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use autoproc_app::ports::{ControlPlane, MessageBroker, SnapshotStore};
use autoproc_domain::control::SequelControl;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for the list endpoint.
#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub enabled_only: bool,
}

/// Request body for enabling or disabling a sequel.
#[derive(Deserialize)]
pub struct SetRequest {
    pub enabled: bool,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<SequelControl>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the set endpoint.
pub enum SetResponse {
    Ok(Json<SequelControl>),
}

impl IntoResponse for SetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/processes/{name}/sequels` — sequels from this process.
pub async fn list<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path(name): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<ListResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let sequels = state.automation.sequels(&name, query.enabled_only).await?;
    Ok(ListResponse::Ok(Json(sequels)))
}

/// `PUT /api/processes/{name}/sequels/{successor}` — enable or disable a sequel.
pub async fn set<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path((name, successor)): Path<(String, String)>,
    Json(req): Json<SetRequest>,
) -> Result<SetResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let sequel = state
        .automation
        .set_sequel(&name, &successor, req.enabled)
        .await?;
    Ok(SetResponse::Ok(Json(sequel)))
}
