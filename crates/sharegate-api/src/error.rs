//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use sharegate_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Handler error. Wraps [`AppError`] so `?` works on service results.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Result type returned by handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Status code for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidPassword | ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Expired | ErrorKind::ViewLimitReached => StatusCode::GONE,
        ErrorKind::CopyTimeout => StatusCode::REQUEST_TIMEOUT,
        ErrorKind::QueueFull => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Malformed | ErrorKind::OperationMismatch | ErrorKind::Validation => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::Conflict | ErrorKind::Cancelled => StatusCode::CONFLICT,
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Storage
        | ErrorKind::Configuration
        | ErrorKind::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind);

        let (code, message) = if err.kind.is_internal() {
            error!(kind = %err.kind, error = %err.message, source = ?err.source, "Internal server error");
            ("INTERNAL_ERROR".to_string(), "Internal server error".to_string())
        } else if err.kind.is_token_misuse() {
            // Which check failed stays in the log.
            warn!(kind = %err.kind, error = %err.message, "Rejected token");
            ("INVALID_TOKEN".to_string(), "Invalid token".to_string())
        } else {
            (err.kind.to_string(), err.message)
        };

        let body = ApiErrorResponse {
            error: code,
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}
