//! Executor error types
//!
//! Execution either fails while planning (caller input) or while reading
//! the dataset (storage). Both keep their own codes.

use thiserror::Error;

use crate::planner::PlannerError;
use crate::storage::StorageError;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Error raised while executing a read
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Filter or page rejected by the planner
    #[error(transparent)]
    Planner(#[from] PlannerError),

    /// Dataset missing or unreadable
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ExecutorError {
    /// Stable error code of the underlying error
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::Planner(e) => e.code().code(),
            ExecutorError::Storage(e) => e.code().code(),
        }
    }
}
