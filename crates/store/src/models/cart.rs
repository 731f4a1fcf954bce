//! Cart entities.

use serde::{Deserialize, Serialize};

use tiendita_core::{Price, ProductId, UserId};

use super::Product;

/// One cart line, composite-keyed by (user, product).
///
/// Carries a snapshot of the product as read; the snapshot is advisory and
/// re-validated against live stock at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub product: Product,
}

impl CartItem {
    /// Line total at the product's current price.
    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}
