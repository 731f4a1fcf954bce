//! Bearer-token authentication for RPC handlers.
//!
//! Tokens are opaque strings; the backend resolves them to a user. A
//! `Bearer ` prefix on the metadata value is accepted and stripped.

use tonic::Status;
use tonic::metadata::MetadataMap;

use tiendita_store::ShopBackend;
use tiendita_store::models::AuthUser;

const AUTHORIZATION: &str = "authorization";
const UNAUTHENTICATED: &str = "authentication required";
const PERMISSION_DENIED: &str = "admin access required";

/// Resolve the caller from request metadata.
///
/// # Errors
///
/// Returns `UNAUTHENTICATED` when the header is missing, malformed, or
/// unknown to the backend.
pub async fn authenticate(
    backend: &dyn ShopBackend,
    metadata: &MetadataMap,
) -> Result<AuthUser, Status> {
    let value = metadata
        .get(AUTHORIZATION)
        .ok_or_else(|| Status::unauthenticated(UNAUTHENTICATED))?;
    let token = value
        .to_str()
        .map_err(|_| Status::unauthenticated(UNAUTHENTICATED))?;
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    let user = backend
        .resolve_token(token)
        .await
        .map_err(|err| crate::status::backend_failure(&err))?;

    user.ok_or_else(|| Status::unauthenticated(UNAUTHENTICATED))
}

/// Resolve the caller and require the admin flag.
///
/// # Errors
///
/// Returns `PERMISSION_DENIED` for an authenticated non-admin.
pub async fn authenticate_admin(
    backend: &dyn ShopBackend,
    metadata: &MetadataMap,
) -> Result<AuthUser, Status> {
    let user = authenticate(backend, metadata).await?;
    if !user.is_admin {
        return Err(Status::permission_denied(PERMISSION_DENIED));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiendita_store::testing::MemoryBackend;
    use tonic::metadata::MetadataValue;

    fn metadata_with(token: &str) -> MetadataMap {
        let mut metadata = MetadataMap::new();
        metadata.insert(
            AUTHORIZATION,
            MetadataValue::try_from(token).expect("ascii token"),
        );
        metadata
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthenticated() {
        let backend = MemoryBackend::new();
        let err = authenticate(&backend, &MetadataMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
        assert_eq!(err.message(), UNAUTHENTICATED);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthenticated() {
        let backend = MemoryBackend::new();
        let err = authenticate(&backend, &metadata_with("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }

    #[tokio::test]
    async fn test_bearer_prefix_is_stripped() {
        let backend = MemoryBackend::new();
        let id = backend.register_user("secret", "ana@example.com", false);

        let user = authenticate(&backend, &metadata_with("Bearer secret"))
            .await
            .expect("auth");
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_non_admin_is_permission_denied() {
        let backend = MemoryBackend::new();
        backend.register_user("secret", "ana@example.com", false);

        let err = authenticate_admin(&backend, &metadata_with("secret"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::PermissionDenied);
        assert_eq!(err.message(), PERMISSION_DENIED);
    }

    #[tokio::test]
    async fn test_admin_passes() {
        let backend = MemoryBackend::new();
        backend.register_user("secret", "root@example.com", true);

        assert!(
            authenticate_admin(&backend, &metadata_with("secret"))
                .await
                .is_ok()
        );
    }
}
