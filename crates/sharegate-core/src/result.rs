//! Convenience result type alias for Sharegate.

use crate::error::AppError;

/// A specialized `Result` type for Sharegate operations.
pub type AppResult<T> = Result<T, AppError>;
