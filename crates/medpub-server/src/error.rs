use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use medpub::{MedpubError, ProxyError, WorkflowError};

/// Errors returned by the `/api` routes.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Workflow(err) => match err {
                WorkflowError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
                WorkflowError::MissingPrerequisite { .. } => {
                    (StatusCode::BAD_REQUEST, self.to_string())
                }
                WorkflowError::NotFound(_) | WorkflowError::DemoNotFound(_) => {
                    (StatusCode::NOT_FOUND, self.to_string())
                }
                WorkflowError::Proxy(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
                WorkflowError::Storage(_) | WorkflowError::Database(_) => {
                    tracing::error!("Request failed: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Error envelope of the `/functions` routes: any proxy failure is a 500
/// carrying the message.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct FunctionError(#[from] pub ProxyError);

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// Failures while starting the service.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Medpub(#[from] MedpubError),

    #[error("Failed to initialize logging: {0}")]
    Telemetry(String),

    #[error("{0}")]
    Setup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
