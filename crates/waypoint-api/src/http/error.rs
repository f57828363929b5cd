//! Application error type mapping to HTTP status codes and a JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use waypoint_core::workflow::engine::EngineError;
use waypoint_types::error::CheckpointError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Engine failure (checkpoint load or save).
    Engine(EngineError),
    /// No thread with this id has been persisted.
    ThreadNotFound(String),
    /// Malformed request body.
    Validation(String),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::Engine(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Engine(EngineError::Checkpoint(e)) => {
                let code = match e {
                    CheckpointError::Decode { .. } => "CHECKPOINT_DECODE",
                    CheckpointError::Storage(_) => "CHECKPOINT_STORAGE",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, code, e.to_string())
            }
            AppError::ThreadNotFound(id) => (
                StatusCode::NOT_FOUND,
                "THREAD_NOT_FOUND",
                format!("Thread '{id}' not found"),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let body = json!({
            "error": {
                "code": code,
                "message": message,
            },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
