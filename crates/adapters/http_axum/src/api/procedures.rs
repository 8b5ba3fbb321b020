//! JSON REST handlers for procedure enablement.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use autoproc_app::ports::{ControlPlane, MessageBroker, SnapshotStore};
use autoproc_domain::param::Params;
use autoproc_domain::procedure::{ProcedureConfig, ProcedureDescriptor};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for enabling or disabling a procedure.
#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub enabled: bool,
    /// Whether the procedure's result is returned to the caller.
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub params: Params,
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<ProcedureDescriptor>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the set status endpoint.
pub enum SetStatusResponse {
    Ok(Json<ProcedureConfig>),
}

impl IntoResponse for SetStatusResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/procedures/{name}` — get a procedure descriptor.
pub async fn get<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path(name): Path<String>,
) -> Result<GetResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let descriptor = state.automation.procedure(&name).await?;
    Ok(GetResponse::Ok(Json(descriptor)))
}

/// `PUT /api/procedures/{name}` — enable or disable a procedure.
pub async fn set_status<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Path(name): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> Result<SetStatusResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let config = state
        .automation
        .set_procedure_status(&name, req.enabled, req.result, req.params)
        .await?;
    Ok(SetStatusResponse::Ok(Json(config)))
}
