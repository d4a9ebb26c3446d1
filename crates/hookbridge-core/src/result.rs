//! Convenience result type alias for HookBridge.

use crate::error::AppError;

/// A specialized `Result` type for HookBridge operations.
pub type AppResult<T> = Result<T, AppError>;
