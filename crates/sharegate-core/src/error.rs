//! Unified application error types for Sharegate.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The domain kinds (`InvalidPassword`,
//! `Expired`, `QueueFull`, ...) are surfaced to callers as-is; the
//! infrastructure kinds are logged and reported without detail.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Unknown alias, id, or download.
    NotFound,
    /// Missing or wrong password on a protected share.
    InvalidPassword,
    /// Share, reverse share, or token is past its expiration.
    Expired,
    /// Share has been viewed its maximum number of times.
    ViewLimitReached,
    /// The download queue is at capacity.
    QueueFull,
    /// The storage backend failed its liveness probe.
    BackendUnavailable,
    /// An adoption copy exceeded its deadline.
    CopyTimeout,
    /// A token could not be decoded or its signature did not verify.
    Malformed,
    /// A token was presented for an operation it was not issued for.
    OperationMismatch,
    /// A queued or active download was cancelled.
    Cancelled,
    /// The caller is not authenticated.
    Unauthorized,
    /// The caller is authenticated but not allowed to perform the action.
    Forbidden,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate alias, concurrent adoption, etc.).
    Conflict,
    /// An internal server error occurred.
    Internal,
    /// A database error occurred.
    Database,
    /// A storage I/O error occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
}

impl ErrorKind {
    /// Whether the kind describes an infrastructure failure whose message
    /// must not reach the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Internal | Self::Database | Self::Storage | Self::Configuration | Self::Serialization
        )
    }

    /// Whether the kind is token misuse, which is treated as hostile input.
    pub fn is_token_misuse(&self) -> bool {
        matches!(self, Self::Malformed | Self::OperationMismatch)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::Expired => "EXPIRED",
            Self::ViewLimitReached => "VIEW_LIMIT_REACHED",
            Self::QueueFull => "QUEUE_FULL",
            Self::BackendUnavailable => "BACKEND_UNAVAILABLE",
            Self::CopyTimeout => "COPY_TIMEOUT",
            Self::Malformed => "MALFORMED_TOKEN",
            Self::OperationMismatch => "OPERATION_MISMATCH",
            Self::Cancelled => "CANCELLED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL",
            Self::Database => "DATABASE",
            Self::Storage => "STORAGE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
        };
        f.write_str(code)
    }
}

/// The unified application error used throughout Sharegate.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid-password error.
    pub fn invalid_password(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPassword, message)
    }

    /// Create an expired error.
    pub fn expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expired, message)
    }

    /// Create a view-limit-reached error.
    pub fn view_limit_reached(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ViewLimitReached, message)
    }

    /// Create a queue-full error.
    pub fn queue_full(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::QueueFull, message)
    }

    /// Create a backend-unavailable error.
    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendUnavailable, message)
    }

    /// Create a copy-timeout error.
    pub fn copy_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CopyTimeout, message)
    }

    /// Create a malformed-token error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed, message)
    }

    /// Create an operation-mismatch error.
    pub fn operation_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OperationMismatch, message)
    }

    /// Create a cancelled error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            return Self::with_source(ErrorKind::NotFound, "Object not found", err);
        }
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err: AppError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err: AppError = std::io::Error::from(std::io::ErrorKind::PermissionDenied).into();
        assert_eq!(err.kind, ErrorKind::Storage);
    }

    #[test]
    fn test_clone_drops_source() {
        let err = AppError::with_source(
            ErrorKind::Database,
            "boom",
            std::io::Error::other("inner"),
        );
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Database);
        assert!(cloned.source.is_none());
        assert_eq!(cloned.to_string(), "DATABASE: boom");
    }

    #[test]
    fn test_kind_classification() {
        assert!(ErrorKind::Storage.is_internal());
        assert!(!ErrorKind::InvalidPassword.is_internal());
        assert!(ErrorKind::Malformed.is_token_misuse());
        assert!(ErrorKind::OperationMismatch.is_token_misuse());
        assert!(!ErrorKind::Expired.is_token_misuse());
    }
}
