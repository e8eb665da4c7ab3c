//! Convenience result type alias for VisitDesk.

use crate::error::AppError;

/// A specialized `Result` type for VisitDesk operations.
pub type AppResult<T> = Result<T, AppError>;
