/*
    errors.rs - Error types for the store subsystem

    Defines the error kinds surfaced by the storage engine:
    - Missing entities
    - Cancelled operations
    - Internal failures (poisoned lock, future backends)
*/

use std::sync::PoisonError;
use thiserror::Error;

/// Coarse classification shared by store and repository errors.
///
/// Callers branch on this instead of matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Cancelled,
    Internal,
}

/// Errors that can occur in the store subsystem
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Cancelled => ErrorKind::Cancelled,
            StoreError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Helper to convert poison errors into StoreError
pub(crate) fn handle_poison<T>(_err: PoisonError<T>) -> StoreError {
    StoreError::Internal("Lock poisoned: a thread panicked while holding the lock".to_string())
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
