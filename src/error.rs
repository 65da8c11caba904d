use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::jobs::queue::QueueError;

pub const VALIDATION_FAILS: &str = "Validation fails";

#[derive(Debug, Error)]
pub enum AppError {
    /// Request body did not match its schema. The detail is logged, never
    /// returned to the caller.
    #[error("validation fails: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(detail) => {
                debug!(detail = %detail, "request validation failed");
                (StatusCode::BAD_REQUEST, VALIDATION_FAILS.to_string())
            }
            // Missing referenced entities share the bad-request status so
            // every controller reports them the same way.
            AppError::NotFound(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Queue(err) => {
                error!(error = %err, "job enqueue failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AppError::Internal(msg) => {
                error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
