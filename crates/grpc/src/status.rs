//! Mapping from store errors onto gRPC status codes.
//!
//! Validation and precondition failures carry their own messages; backend
//! failures are captured to Sentry, logged, and masked behind a fixed
//! message so internal details never cross the wire.

use tonic::Status;

use tiendita_store::StoreError;
use tiendita_store::db::RepositoryError;

const INTERNAL: &str = "internal server error";

/// Convert a store error into the status returned to the caller.
#[must_use]
pub fn to_status(err: StoreError) -> Status {
    match err {
        StoreError::Unauthenticated => Status::unauthenticated(err.to_string()),
        StoreError::PermissionDenied => Status::permission_denied(err.to_string()),
        StoreError::InvalidArgument(message) => Status::invalid_argument(message),
        StoreError::FailedPrecondition(message) => Status::failed_precondition(message),
        StoreError::NotFound(message) => Status::not_found(message),
        StoreError::Backend(inner) => backend_failure(&inner),
    }
}

/// Status for an opaque backend failure, after capture.
#[must_use]
pub fn backend_failure(err: &RepositoryError) -> Status {
    tracing::error!(error = %err, "backend failure");
    sentry::capture_message(&err.to_string(), sentry::Level::Error);
    Status::internal(INTERNAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn test_variant_mapping() {
        assert_eq!(to_status(StoreError::Unauthenticated).code(), Code::Unauthenticated);
        assert_eq!(to_status(StoreError::PermissionDenied).code(), Code::PermissionDenied);
        assert_eq!(
            to_status(StoreError::InvalidArgument("bad".to_string())).code(),
            Code::InvalidArgument
        );
        assert_eq!(
            to_status(StoreError::FailedPrecondition("empty".to_string())).code(),
            Code::FailedPrecondition
        );
        assert_eq!(
            to_status(StoreError::NotFound("missing".to_string())).code(),
            Code::NotFound
        );
    }

    #[test]
    fn test_backend_errors_are_masked() {
        let status = to_status(StoreError::Backend(RepositoryError::DataCorruption(
            "row 42 has malformed json".to_string(),
        )));
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), INTERNAL);
    }
}
