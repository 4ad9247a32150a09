//! # Application Errors
//!
//! Error types for the application layer.
//!
//! These errors represent failures that can occur during use case execution,
//! including validation failures, business rule violations, and storage errors.
//! Every error reports one of the marketplace failure kinds through
//! [`ApplicationError::kind`].
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── Domain(DomainError)         - Business rule violations
//! ├── Repository(RepositoryError) - Storage failures
//! ├── Validation(String)          - Input validation failures
//! ├── NotFound { .. }             - Listing, offer or group not found
//! ├── Forbidden(String)           - Wrong role or not the owner
//! ├── InvalidState(String)        - Transition not allowed
//! ├── Conflict { .. }             - Optimistic retries exhausted
//! └── Internal(String)            - Anything else
//! ```
//!
//! # Examples
//!
//! ```
//! use procurement_engine::application::error::ApplicationError;
//! use procurement_engine::domain::errors::ErrorKind;
//!
//! let err = ApplicationError::not_found("Request", "req-123");
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//! ```

use crate::domain::errors::{DomainError, ErrorKind};
use crate::infrastructure::persistence::RepositoryError;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain error from business logic.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Storage error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("not found: {resource_type} with id {id}")]
    NotFound {
        /// Type of resource.
        resource_type: String,
        /// Resource identifier.
        id: String,
    },

    /// The actor may not perform the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Invalid state for operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Concurrent writers kept winning.
    #[error("conflict: {operation} gave up after {attempts} attempts")]
    Conflict {
        /// Operation that was retried.
        operation: String,
        /// Attempts made.
        attempts: u32,
    },

    /// Event publishing error.
    #[error("event publishing error: {0}")]
    EventPublishError(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(operation: impl Into<String>, attempts: u32) -> Self {
        Self::Conflict {
            operation: operation.into(),
            attempts,
        }
    }

    /// Creates an event publish error.
    #[must_use]
    pub fn event_publish(message: impl Into<String>) -> Self {
        Self::EventPublishError(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the failure category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(e) => e.kind(),
            Self::Repository(e) => match e {
                RepositoryError::NotFound { .. } => ErrorKind::NotFound,
                RepositoryError::Duplicate { .. } => ErrorKind::InvalidState,
                RepositoryError::VersionConflict { .. } => ErrorKind::Conflict,
                RepositoryError::Connection(_) | RepositoryError::Internal(_) => {
                    ErrorKind::Internal
                }
            },
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::EventPublishError(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if re-reading and trying again may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Repository(e) if e.is_version_conflict())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Returns true if this is an authorization error.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.kind() == ErrorKind::Forbidden
    }

    /// Returns true if this is an invalid state error.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        self.kind() == ErrorKind::InvalidState
    }

    /// Returns true if this is a conflict error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_error_validation() {
        let err = ApplicationError::validation("quantity must look like 50kg");
        assert!(err.to_string().contains("50kg"));
        assert!(err.is_validation());
    }

    #[test]
    fn application_error_not_found() {
        let err = ApplicationError::not_found("Request", "req-123");
        assert!(err.to_string().contains("Request"));
        assert!(err.to_string().contains("req-123"));
        assert!(err.is_not_found());
    }

    #[test]
    fn application_error_forbidden() {
        let err = ApplicationError::forbidden("only the owner can accept");
        assert!(err.is_forbidden());
        assert!(!err.is_retryable());
    }

    #[test]
    fn application_error_conflict() {
        let err = ApplicationError::conflict("accept_offer", 5);
        assert!(err.to_string().contains("accept_offer"));
        assert!(err.to_string().contains('5'));
        assert!(err.is_conflict());
    }

    #[test]
    fn domain_errors_keep_their_kind() {
        let err: ApplicationError = DomainError::LeaderMustReassign.into();
        assert!(err.is_invalid_state());
        let err: ApplicationError = DomainError::forbidden("nope").into();
        assert!(err.is_forbidden());
        let err: ApplicationError = DomainError::InvalidQuantity("lots".into()).into();
        assert!(err.is_validation());
    }

    #[test]
    fn repository_errors_map_to_kinds() {
        let err: ApplicationError = RepositoryError::version_conflict("Offer", "o-1", 1, 2).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.is_retryable());

        let err: ApplicationError = RepositoryError::duplicate("GroupRequest", "g-1").into();
        assert!(err.is_invalid_state());

        let err: ApplicationError = RepositoryError::not_found("Group", "g-1").into();
        assert!(err.is_not_found());

        let err: ApplicationError = RepositoryError::connection("refused").into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
