//! Per-user shopping cart.
//!
//! One row per (user, product); adding an item that is already in the cart
//! replaces its quantity instead of accumulating. Stock checks here are
//! advisory only; the authoritative check is the decrement inside the
//! order-creation transaction.

use tracing::instrument;

use tiendita_core::{Price, ProductId, UserId};

use crate::backend::ShopBackend;
use crate::error::{Result, StoreError};
use crate::models::CartItem;

/// Cart operations for one backend.
pub struct CartService<'a> {
    backend: &'a dyn ShopBackend,
}

impl<'a> CartService<'a> {
    /// Create a cart service over a backend.
    #[must_use]
    pub const fn new(backend: &'a dyn ShopBackend) -> Self {
        Self { backend }
    }

    /// A user's cart lines with product snapshots, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the read fails.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<CartItem>> {
        Ok(self.backend.cart_items(user_id).await?)
    }

    /// Count of distinct cart lines (not the quantity sum).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the read fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64> {
        Ok(self.backend.cart_count(user_id).await?)
    }

    /// Sum of quantity times unit price across the cart.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the read fails.
    pub async fn total(&self, user_id: UserId) -> Result<Price> {
        let items = self.backend.cart_items(user_id).await?;
        Ok(items
            .iter()
            .fold(Price::ZERO, |acc, item| acc.plus(item.line_total())))
    }

    /// Put a product in the cart at the given quantity, replacing any
    /// existing line for it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidArgument` for a non-positive quantity,
    /// `StoreError::NotFound` for an unknown product, and
    /// `StoreError::FailedPrecondition` when the quantity exceeds stock.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id, quantity = %quantity))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<()> {
        if quantity < 1 {
            return Err(StoreError::InvalidArgument(
                "quantity must be at least 1".to_string(),
            ));
        }

        let product = self
            .backend
            .product(product_id)
            .await?
            .ok_or_else(|| StoreError::NotFound("product not found".to_string()))?;

        if quantity > product.stock {
            return Err(StoreError::FailedPrecondition(
                "insufficient stock".to_string(),
            ));
        }

        Ok(self
            .backend
            .upsert_cart_item(user_id, product_id, quantity)
            .await?)
    }

    /// Set the quantity of a cart line; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::FailedPrecondition` when the new quantity
    /// exceeds stock.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id, quantity = %quantity))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<()> {
        if quantity <= 0 {
            return self.remove(user_id, product_id).await;
        }

        self.add_to_cart(user_id, product_id, quantity).await
    }

    /// Remove a cart line. Removing an absent line succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the delete fails.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<()> {
        Ok(self.backend.delete_cart_item(user_id, product_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryBackend;

    #[tokio::test]
    async fn test_add_replaces_quantity() {
        let backend = MemoryBackend::new();
        let user_id = UserId::generate();
        let product = backend.add_product("Olive oil", 1200, 10);
        let cart = CartService::new(&backend);

        cart.add_to_cart(user_id, product, 2).await.expect("add");
        cart.add_to_cart(user_id, product, 5).await.expect("re-add");

        let items = cart.items(user_id).await.expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_quantity() {
        let backend = MemoryBackend::new();
        let user_id = UserId::generate();
        let product = backend.add_product("Olive oil", 1200, 10);
        let cart = CartService::new(&backend);

        let err = cart.add_to_cart(user_id, product, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));

        // Nothing written
        assert_eq!(cart.count(user_id).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_add_rejects_over_stock() {
        let backend = MemoryBackend::new();
        let user_id = UserId::generate();
        let product = backend.add_product("Olive oil", 1200, 3);
        let cart = CartService::new(&backend);

        let err = cart.add_to_cart(user_id, product, 4).await.unwrap_err();
        assert!(matches!(err, StoreError::FailedPrecondition(_)));
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let backend = MemoryBackend::new();
        let cart = CartService::new(&backend);

        let err = cart
            .add_to_cart(UserId::generate(), ProductId::generate(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let backend = MemoryBackend::new();
        let user_id = UserId::generate();
        let product = backend.add_product("Olive oil", 1200, 10);
        let cart = CartService::new(&backend);

        cart.add_to_cart(user_id, product, 2).await.expect("add");
        cart.update_quantity(user_id, product, 0)
            .await
            .expect("update to zero");

        assert_eq!(cart.count(user_id).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let backend = MemoryBackend::new();
        let user_id = UserId::generate();
        let product = backend.add_product("Olive oil", 1200, 10);
        let cart = CartService::new(&backend);

        cart.remove(user_id, product).await.expect("first remove");
        cart.remove(user_id, product).await.expect("second remove");
    }

    #[tokio::test]
    async fn test_total_sums_line_totals() {
        let backend = MemoryBackend::new();
        let user_id = UserId::generate();
        let oil = backend.add_product("Olive oil", 1200, 10);
        let rice = backend.add_product("Rice", 300, 10);
        let cart = CartService::new(&backend);

        cart.add_to_cart(user_id, oil, 2).await.expect("add oil");
        cart.add_to_cart(user_id, rice, 3).await.expect("add rice");

        assert_eq!(
            cart.total(user_id).await.expect("total"),
            Price::from_minor(2 * 1200 + 3 * 300)
        );
    }
}
