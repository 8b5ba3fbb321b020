//! JSON REST handlers for whole-configuration snapshots.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use autoproc_app::ports::{ControlPlane, MessageBroker, SnapshotStore};
use autoproc_domain::snapshot::Snapshot;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the get and store endpoints.
pub enum SnapshotResponse {
    Ok(Json<Snapshot>),
}

impl IntoResponse for SnapshotResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the load and reset endpoints.
pub enum AppliedResponse {
    NoContent,
}

impl IntoResponse for AppliedResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/configuration` — capture the live configuration.
pub async fn get<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
) -> Result<SnapshotResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let snapshot = state.automation.snapshot().await?;
    Ok(SnapshotResponse::Ok(Json(snapshot)))
}

/// `PUT /api/configuration` — make a snapshot the live configuration.
pub async fn load<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
    Json(snapshot): Json<Snapshot>,
) -> Result<AppliedResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    state.automation.load(&snapshot).await?;
    Ok(AppliedResponse::NoContent)
}

/// `POST /api/configuration/reset` — restore the bootstrap configuration.
pub async fn reset<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
) -> Result<AppliedResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    state.automation.reset().await?;
    Ok(AppliedResponse::NoContent)
}

/// `POST /api/configuration/store` — persist the live configuration.
pub async fn store<CP, SS, B>(
    State(state): State<AppState<CP, SS, B>>,
) -> Result<SnapshotResponse, ApiError>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    let snapshot = state.automation.store().await?;
    Ok(SnapshotResponse::Ok(Json(snapshot)))
}
