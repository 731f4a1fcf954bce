//! User profile and address management.

use tracing::instrument;

use tiendita_core::{AddressId, AddressKind, UserId};

use crate::backend::ShopBackend;
use crate::error::{Result, StoreError};
use crate::models::{Address, NewAddress, ProfilePatch, UserProfile};

/// Profile and address operations.
pub struct ProfileService<'a> {
    backend: &'a dyn ShopBackend,
}

impl<'a> ProfileService<'a> {
    /// Create a profile service over a backend.
    #[must_use]
    pub const fn new(backend: &'a dyn ShopBackend) -> Self {
        Self { backend }
    }

    /// A user's profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the user has no profile row yet.
    pub async fn profile(&self, user_id: UserId) -> Result<UserProfile> {
        self.backend
            .profile(user_id)
            .await?
            .ok_or_else(|| StoreError::NotFound("profile not found".to_string()))
    }

    /// Merge-patch a profile, creating it on first write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the write fails.
    #[instrument(skip(self, patch), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        patch: ProfilePatch,
    ) -> Result<UserProfile> {
        Ok(self.backend.update_profile(user_id, patch).await?)
    }

    /// A user's addresses of a kind, default first then newest.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the read fails.
    pub async fn addresses(&self, user_id: UserId, kind: AddressKind) -> Result<Vec<Address>> {
        Ok(self.backend.addresses(user_id, kind).await?)
    }

    /// Add an address.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidArgument` when the primary line is blank.
    #[instrument(skip(self, new), fields(user_id = %new.user_id, kind = ?new.kind))]
    pub async fn add_address(&self, new: NewAddress) -> Result<Address> {
        if new.line1.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "address line must not be blank".to_string(),
            ));
        }

        Ok(self.backend.insert_address(new).await?)
    }

    /// Delete one of the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the address isn't the user's.
    #[instrument(skip(self), fields(user_id = %user_id, id = %id))]
    pub async fn delete_address(&self, user_id: UserId, id: AddressId) -> Result<()> {
        // Ownership check first; the delete itself is unconditional.
        let owned = self.owns_address(user_id, id).await?;
        if !owned {
            return Err(StoreError::NotFound("address not found".to_string()));
        }

        Ok(self.backend.delete_address(id).await?)
    }

    /// Make an address the sole default of its kind for the user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the address isn't the user's.
    #[instrument(skip(self), fields(user_id = %user_id, kind = ?kind, id = %id))]
    pub async fn set_default_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
        id: AddressId,
    ) -> Result<()> {
        Ok(self.backend.set_default_address(user_id, kind, id).await?)
    }

    async fn owns_address(&self, user_id: UserId, id: AddressId) -> Result<bool> {
        for kind in [AddressKind::Shipping, AddressKind::Billing] {
            let addresses = self.backend.addresses(user_id, kind).await?;
            if addresses.iter().any(|a| a.id == id) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingPatch, BillingSnapshot};
    use crate::testing::MemoryBackend;

    fn new_address(user_id: UserId, kind: AddressKind, is_default: bool) -> NewAddress {
        NewAddress {
            user_id,
            kind,
            name: "Home".to_string(),
            line1: "Calle Mayor 1".to_string(),
            line2: None,
            city: "Madrid".to_string(),
            state: "Madrid".to_string(),
            postal_code: "28001".to_string(),
            country: "ES".to_string(),
            is_default,
        }
    }

    #[tokio::test]
    async fn test_first_default_wins_until_replaced() {
        let backend = MemoryBackend::new();
        let user_id = UserId::generate();
        let service = ProfileService::new(&backend);

        let first = service
            .add_address(new_address(user_id, AddressKind::Shipping, true))
            .await
            .expect("first");
        let second = service
            .add_address(new_address(user_id, AddressKind::Shipping, true))
            .await
            .expect("second");

        let addresses = service
            .addresses(user_id, AddressKind::Shipping)
            .await
            .expect("list");
        assert_eq!(addresses.len(), 2);
        let defaults: Vec<_> = addresses.iter().filter(|a| a.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, second.id);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_set_default_flips_exactly_one() {
        let backend = MemoryBackend::new();
        let user_id = UserId::generate();
        let service = ProfileService::new(&backend);

        let first = service
            .add_address(new_address(user_id, AddressKind::Shipping, true))
            .await
            .expect("first");
        let second = service
            .add_address(new_address(user_id, AddressKind::Shipping, false))
            .await
            .expect("second");

        service
            .set_default_address(user_id, AddressKind::Shipping, second.id)
            .await
            .expect("set default");

        let addresses = service
            .addresses(user_id, AddressKind::Shipping)
            .await
            .expect("list");
        for address in &addresses {
            assert_eq!(address.is_default, address.id == second.id);
        }
        assert!(addresses.iter().any(|a| a.id == first.id));
    }

    #[tokio::test]
    async fn test_set_default_foreign_address_is_not_found() {
        let backend = MemoryBackend::new();
        let service = ProfileService::new(&backend);

        let err = service
            .set_default_address(
                UserId::generate(),
                AddressKind::Shipping,
                AddressId::generate(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_foreign_address_is_not_found() {
        let backend = MemoryBackend::new();
        let user_id = UserId::generate();
        let other = UserId::generate();
        let service = ProfileService::new(&backend);

        let theirs = service
            .add_address(new_address(other, AddressKind::Shipping, true))
            .await
            .expect("their address");

        let err = service
            .delete_address(user_id, theirs.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        // Still there for its owner.
        let addresses = service
            .addresses(other, AddressKind::Shipping)
            .await
            .expect("list");
        assert_eq!(addresses.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_line1_rejected() {
        let backend = MemoryBackend::new();
        let service = ProfileService::new(&backend);
        let mut address = new_address(UserId::generate(), AddressKind::Shipping, true);
        address.line1 = "  ".to_string();

        let err = service.add_address(address).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_update_profile_creates_then_merges() {
        let backend = MemoryBackend::new();
        let user_id = backend.register_user("token-1", "ana@example.com", false);
        let service = ProfileService::new(&backend);

        let created = service
            .update_profile(
                user_id,
                ProfilePatch {
                    tax_id: Some("B12345678".to_string()),
                    ..ProfilePatch::default()
                },
            )
            .await
            .expect("create");
        assert_eq!(created.tax_id.as_deref(), Some("B12345678"));
        assert_eq!(created.email, "ana@example.com");

        let merged = service
            .update_profile(
                user_id,
                ProfilePatch {
                    billing_address: Some(BillingPatch {
                        line1: Some("Calle Mayor 1".to_string()),
                        ..BillingPatch::default()
                    }),
                    ..ProfilePatch::default()
                },
            )
            .await
            .expect("merge");
        assert_eq!(merged.tax_id.as_deref(), Some("B12345678"));
        let billing: BillingSnapshot = merged.billing_address.expect("snapshot");
        assert!(billing.is_complete());
    }
}
