//! Errors
//!
//! Backend failures and draft validation failures.

use thiserror::Error;

use crate::models::DraftField;

/// Failure reported by the backing service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Common result type for backend operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Draft rejected before any state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter a name and description ({0} is empty)")]
    MissingField(DraftField),
}
