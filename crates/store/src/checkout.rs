//! The checkout orchestrator.
//!
//! Checkout is a short pipeline that can suspend instead of failing: a
//! missing default shipping address or an incomplete billing snapshot
//! returns a [`CheckoutOutcome`] variant telling the caller what to
//! collect, with nothing written. Once both are present, the profile's
//! billing snapshot is materialized as a fresh default billing-address
//! row (one per checkout, deliberately), the cart is snapshotted into an
//! order, and the backend commits stock decrement, item inserts, and the
//! cart wipe in one transaction.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use tiendita_core::{AddressKind, OrderId, Price, UserId};

use crate::backend::ShopBackend;
use crate::error::{Result, StoreError};
use crate::models::{NewAddress, NewOrder, OrderLine};

/// Result of a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutOutcome {
    /// The order was placed.
    Completed { order_id: OrderId, total: Price },
    /// No default shipping address; collect one and retry.
    NeedsShippingAddress,
    /// No usable billing snapshot on the profile; collect one and retry.
    NeedsBillingAddress,
}

/// Drives the checkout pipeline.
pub struct CheckoutService<'a> {
    backend: &'a dyn ShopBackend,
}

impl<'a> CheckoutService<'a> {
    /// Create a checkout service over a backend.
    #[must_use]
    pub const fn new(backend: &'a dyn ShopBackend) -> Self {
        Self { backend }
    }

    /// Attempt to check out the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::FailedPrecondition` for an empty cart or for
    /// insufficient stock at commit time; the suspension cases are `Ok`
    /// outcomes, not errors.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn checkout(&self, user_id: UserId) -> Result<CheckoutOutcome> {
        let items = self.backend.cart_items(user_id).await?;
        if items.is_empty() {
            return Err(StoreError::FailedPrecondition(
                "cart is empty".to_string(),
            ));
        }

        let Some(shipping) = self
            .backend
            .default_address(user_id, AddressKind::Shipping)
            .await?
        else {
            return Ok(CheckoutOutcome::NeedsShippingAddress);
        };

        let Some(profile) = self.backend.profile(user_id).await? else {
            return Ok(CheckoutOutcome::NeedsBillingAddress);
        };
        let Some(snapshot) = profile.billing_address.as_ref().filter(|s| s.is_complete())
        else {
            return Ok(CheckoutOutcome::NeedsBillingAddress);
        };

        // Materialize the snapshot as a new default billing row. Every
        // checkout adds one; earlier rows stay as history.
        let billing = self
            .backend
            .insert_address(NewAddress {
                user_id,
                kind: AddressKind::Billing,
                name: profile.email.clone(),
                line1: snapshot.line1.clone(),
                line2: snapshot.line2.clone(),
                city: snapshot.city.clone(),
                state: snapshot.state.clone(),
                postal_code: snapshot.postal_code.clone(),
                country: snapshot.country.clone(),
                is_default: true,
            })
            .await?;

        let lines: Vec<OrderLine> = items
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.product.price,
            })
            .collect();

        let new_order = NewOrder {
            user_id,
            shipping_address_id: shipping.id,
            billing_address_id: billing.id,
            lines,
        };
        let total = new_order.total();

        let order_id = self.backend.create_order(new_order).await?;
        tracing::info!(%order_id, %user_id, %total, "order placed");

        Ok(CheckoutOutcome::Completed { order_id, total })
    }
}
