//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use autoproc_domain::error::{AutoProcError, ExecutionError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<String>,
}

/// Maps [`AutoProcError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(AutoProcError);

impl From<AutoProcError> for ApiError {
    fn from(err: AutoProcError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AutoProcError::Validation(_) | AutoProcError::Naming(_) => StatusCode::BAD_REQUEST,
            AutoProcError::NotFound(_) | AutoProcError::InvalidProcessType(_) => {
                StatusCode::NOT_FOUND
            }
            AutoProcError::RestrictionViolation(_) => StatusCode::CONFLICT,
            AutoProcError::Configuration(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AutoProcError::Execution(ExecutionError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            AutoProcError::Execution(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AutoProcError::ControlPlane(_)
            | AutoProcError::Messaging(_)
            | AutoProcError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.0 {
            AutoProcError::Execution(ExecutionError::Aggregate {
                root_cause,
                failures,
                ..
            }) => ErrorBody {
                error: root_cause,
                failures,
            },
            AutoProcError::ControlPlane(err)
            | AutoProcError::Messaging(err)
            | AutoProcError::Storage(err) => {
                tracing::error!(error = %err, "adapter error");
                ErrorBody {
                    error: "internal server error".to_string(),
                    failures: Vec::new(),
                }
            }
            other => ErrorBody {
                error: other.to_string(),
                failures: Vec::new(),
            },
        };

        (status, Json(body)).into_response()
    }
}
