//! Orders and their immutable item snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tiendita_core::{AddressId, OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

/// One line of an order.
///
/// `price_at_time` is the per-unit price captured at purchase time and is
/// immune to later catalog price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price_at_time: Price,
}

/// Shipment tracking attached by fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderTracking {
    pub tracking_number: String,
    pub carrier: String,
    pub status: String,
    pub location: String,
}

/// A placed order. Immutable except for status and tracking updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub tracking: Option<OrderTracking>,
}

/// One line of the cart snapshot passed into order creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Per-unit price at snapshot time.
    pub price: Price,
}

/// Input for the atomic order-creation operation.
///
/// The backend creates the order and its items, decrements stock
/// (rejecting overdraft), and clears the user's cart rows, all in a single
/// transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub lines: Vec<OrderLine>,
}

impl NewOrder {
    /// Order total: sum of line quantity x unit price.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines
            .iter()
            .fold(Price::ZERO, |acc, line| acc.plus(line.price.times(line.quantity)))
    }
}

/// Admin order-listing filter.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

/// One page of the admin order listing.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total_count: i64,
}
