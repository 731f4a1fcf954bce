//! Store error taxonomy.
//!
//! Validation failures are classified before any backend call and returned
//! without side effects; backend-reported errors are wrapped and
//! re-classified here rather than passed through raw. The gRPC facade maps
//! each variant onto a status code with a fixed message.

use thiserror::Error;

use crate::db::RepositoryError;

/// Application-level error type for the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No authenticated user could be resolved.
    #[error("authentication required")]
    Unauthenticated,

    /// The resolved user lacks the admin flag.
    #[error("admin access required")]
    PermissionDenied,

    /// Caller-supplied input is invalid (e.g. non-positive quantity).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A precondition on current state failed (e.g. insufficient stock).
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Opaque backend failure; details are logged, never surfaced.
    #[error("backend error: {0}")]
    Backend(#[source] RepositoryError),
}

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("not found".to_string()),
            RepositoryError::InsufficientStock => {
                Self::FailedPrecondition("insufficient stock".to_string())
            }
            other => Self::Backend(other),
        }
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_classification() {
        assert!(matches!(
            StoreError::from(RepositoryError::NotFound),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            StoreError::from(RepositoryError::InsufficientStock),
            StoreError::FailedPrecondition(_)
        ));
        assert!(matches!(
            StoreError::from(RepositoryError::DataCorruption("bad json".to_string())),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn test_display_messages_are_fixed() {
        assert_eq!(
            StoreError::Unauthenticated.to_string(),
            "authentication required"
        );
        assert_eq!(
            StoreError::PermissionDenied.to_string(),
            "admin access required"
        );
    }
}
