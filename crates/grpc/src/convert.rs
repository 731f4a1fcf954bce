//! Conversions between domain types and their proto counterparts.
//!
//! Wire ids and timestamps are strings; parsing failures surface as
//! `INVALID_ARGUMENT` before any backend call.

use chrono::{DateTime, Utc};
use tonic::Status;

use tiendita_core::{AddressId, AddressKind, CategoryId, OrderStatus, PaymentMode, ProductId};
use tiendita_store::models::{
    Address, BillingPatch, BillingSnapshot, CartItem, Category, Currency, Order, OrderItem,
    OrderTracking, Product, ProfilePatch, UserProfile,
};
use tiendita_store::reporting::{CategorySales, DailySales, ProductSales, SalesStats};

use crate::proto;

// ============================================================
// Parsing request fields
// ============================================================

/// Parse a product id.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` when the string is not a UUID.
pub fn parse_product_id(raw: &str) -> Result<ProductId, Status> {
    ProductId::parse(raw).map_err(|_| Status::invalid_argument("invalid product id"))
}

/// Parse a category id.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` when the string is not a UUID.
pub fn parse_category_id(raw: &str) -> Result<CategoryId, Status> {
    CategoryId::parse(raw).map_err(|_| Status::invalid_argument("invalid category id"))
}

/// Parse an optional category filter; empty string means no filter.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` when non-empty and not a UUID.
pub fn parse_category_filter(raw: &str) -> Result<Option<CategoryId>, Status> {
    if raw.is_empty() {
        return Ok(None);
    }
    parse_category_id(raw).map(Some)
}

/// Parse an address id.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` when the string is not a UUID.
pub fn parse_address_id(raw: &str) -> Result<AddressId, Status> {
    AddressId::parse(raw).map_err(|_| Status::invalid_argument("invalid address id"))
}

/// Parse an order id.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` when the string is not a UUID.
pub fn parse_order_id(raw: &str) -> Result<tiendita_core::OrderId, Status> {
    tiendita_core::OrderId::parse(raw).map_err(|_| Status::invalid_argument("invalid order id"))
}

/// Parse a required RFC 3339 timestamp.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` naming the field on failure.
pub fn parse_datetime(raw: &str, field: &str) -> Result<DateTime<Utc>, Status> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Status::invalid_argument(format!("invalid {field}: expected RFC 3339")))
}

/// Parse an optional RFC 3339 timestamp; empty string means unbounded.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` when non-empty and malformed.
pub fn parse_optional_datetime(raw: &str, field: &str) -> Result<Option<DateTime<Utc>>, Status> {
    if raw.is_empty() {
        return Ok(None);
    }
    parse_datetime(raw, field).map(Some)
}

/// Decode a wire address kind.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` for unknown or unspecified values.
pub fn address_kind_from_proto(raw: i32) -> Result<AddressKind, Status> {
    match proto::AddressKind::try_from(raw) {
        Ok(proto::AddressKind::Shipping) => Ok(AddressKind::Shipping),
        Ok(proto::AddressKind::Billing) => Ok(AddressKind::Billing),
        _ => Err(Status::invalid_argument("address kind must be specified")),
    }
}

/// Decode a required wire order status.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` for unknown or unspecified values.
pub fn order_status_from_proto(raw: i32) -> Result<OrderStatus, Status> {
    match proto::OrderStatus::try_from(raw) {
        Ok(proto::OrderStatus::Pending) => Ok(OrderStatus::Pending),
        Ok(proto::OrderStatus::Processing) => Ok(OrderStatus::Processing),
        Ok(proto::OrderStatus::Shipped) => Ok(OrderStatus::Shipped),
        Ok(proto::OrderStatus::Delivered) => Ok(OrderStatus::Delivered),
        Ok(proto::OrderStatus::Cancelled) => Ok(OrderStatus::Cancelled),
        _ => Err(Status::invalid_argument("order status must be specified")),
    }
}

/// Decode an order-status filter; unspecified means no filter.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` for values outside the enum.
pub fn order_status_filter(raw: i32) -> Result<Option<OrderStatus>, Status> {
    match proto::OrderStatus::try_from(raw) {
        Ok(proto::OrderStatus::Unspecified) => Ok(None),
        Ok(_) => order_status_from_proto(raw).map(Some),
        Err(_) => Err(Status::invalid_argument("unknown order status")),
    }
}

/// Decode an optional wire payment mode.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` for unknown or unspecified values.
pub fn payment_mode_from_proto(raw: i32) -> Result<PaymentMode, Status> {
    match proto::PaymentMode::try_from(raw) {
        Ok(proto::PaymentMode::Prepaid) => Ok(PaymentMode::Prepaid),
        Ok(proto::PaymentMode::Postpaid) => Ok(PaymentMode::Postpaid),
        _ => Err(Status::invalid_argument("payment mode must be specified")),
    }
}

/// Build a profile merge-patch from the wire request.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` for an unusable payment mode.
pub fn profile_patch_from_proto(req: proto::UpdateProfileRequest) -> Result<ProfilePatch, Status> {
    let payment_mode = req.payment_mode.map(payment_mode_from_proto).transpose()?;
    let billing_address = req.billing_address.map(|patch| BillingPatch {
        line1: patch.line1,
        line2: patch.line2,
        city: patch.city,
        state: patch.state,
        postal_code: patch.postal_code,
        country: patch.country,
    });

    Ok(ProfilePatch {
        tax_id: req.tax_id,
        company_name: req.company_name,
        phone: req.phone,
        phone_prefix: req.phone_prefix,
        payment_mode,
        billing_address,
    })
}

// ============================================================
// Encoding responses
// ============================================================

#[must_use]
pub fn product_to_proto(product: Product) -> proto::Product {
    proto::Product {
        id: product.id.to_string(),
        name: product.name,
        description: product.description,
        price: product.price.as_minor(),
        image_url: product.image_url,
        stock: product.stock,
        category_id: product.category_id.to_string(),
        currency_code: product.currency_code,
        created_at: product.created_at.to_rfc3339(),
    }
}

#[must_use]
pub fn category_to_proto(category: Category) -> proto::Category {
    proto::Category {
        id: category.id.to_string(),
        name: category.name,
        description: category.description,
    }
}

#[must_use]
pub fn currency_to_proto(currency: Currency) -> proto::Currency {
    proto::Currency {
        code: currency.code,
        name: currency.name,
        symbol: currency.symbol,
        rate: currency.rate,
        is_base: currency.is_base,
    }
}

#[must_use]
pub fn cart_item_to_proto(item: CartItem) -> proto::CartItem {
    let line_total = item.line_total().as_minor();
    proto::CartItem {
        quantity: item.quantity,
        line_total,
        product: Some(product_to_proto(item.product)),
    }
}

#[must_use]
pub const fn order_status_to_proto(status: OrderStatus) -> proto::OrderStatus {
    match status {
        OrderStatus::Pending => proto::OrderStatus::Pending,
        OrderStatus::Processing => proto::OrderStatus::Processing,
        OrderStatus::Shipped => proto::OrderStatus::Shipped,
        OrderStatus::Delivered => proto::OrderStatus::Delivered,
        OrderStatus::Cancelled => proto::OrderStatus::Cancelled,
    }
}

#[must_use]
pub fn order_to_proto(order: Order) -> proto::Order {
    proto::Order {
        id: order.id.to_string(),
        user_id: order.user_id.to_string(),
        status: order_status_to_proto(order.status) as i32,
        total_amount: order.total_amount.as_minor(),
        created_at: order.created_at.to_rfc3339(),
        updated_at: order.updated_at.to_rfc3339(),
        items: order.items.into_iter().map(order_item_to_proto).collect(),
        tracking: order.tracking.map(tracking_to_proto),
    }
}

fn order_item_to_proto(item: OrderItem) -> proto::OrderItem {
    proto::OrderItem {
        id: item.id.to_string(),
        product_id: item.product_id.to_string(),
        product_name: item.product_name,
        quantity: item.quantity,
        price_at_time: item.price_at_time.as_minor(),
    }
}

fn tracking_to_proto(tracking: OrderTracking) -> proto::OrderTracking {
    proto::OrderTracking {
        tracking_number: tracking.tracking_number,
        carrier: tracking.carrier,
        status: tracking.status,
        location: tracking.location,
    }
}

#[must_use]
pub const fn address_kind_to_proto(kind: AddressKind) -> proto::AddressKind {
    match kind {
        AddressKind::Shipping => proto::AddressKind::Shipping,
        AddressKind::Billing => proto::AddressKind::Billing,
    }
}

#[must_use]
pub fn address_to_proto(address: Address) -> proto::Address {
    proto::Address {
        id: address.id.to_string(),
        user_id: address.user_id.to_string(),
        kind: address_kind_to_proto(address.kind) as i32,
        name: address.name,
        line1: address.line1,
        line2: address.line2.unwrap_or_default(),
        city: address.city,
        state: address.state,
        postal_code: address.postal_code,
        country: address.country,
        is_default: address.is_default,
        created_at: address.created_at.to_rfc3339(),
    }
}

#[must_use]
pub const fn payment_mode_to_proto(mode: PaymentMode) -> proto::PaymentMode {
    match mode {
        PaymentMode::Prepaid => proto::PaymentMode::Prepaid,
        PaymentMode::Postpaid => proto::PaymentMode::Postpaid,
    }
}

#[must_use]
pub fn profile_to_proto(profile: UserProfile) -> proto::Profile {
    proto::Profile {
        user_id: profile.user_id.to_string(),
        email: profile.email,
        tax_id: profile.tax_id.unwrap_or_default(),
        company_name: profile.company_name.unwrap_or_default(),
        phone: profile.phone.unwrap_or_default(),
        phone_prefix: profile.phone_prefix.unwrap_or_default(),
        payment_mode: payment_mode_to_proto(profile.payment_mode) as i32,
        billing_address: profile.billing_address.map(billing_to_proto),
    }
}

fn billing_to_proto(snapshot: BillingSnapshot) -> proto::BillingAddress {
    proto::BillingAddress {
        line1: snapshot.line1,
        line2: snapshot.line2.unwrap_or_default(),
        city: snapshot.city,
        state: snapshot.state,
        postal_code: snapshot.postal_code,
        country: snapshot.country,
    }
}

#[must_use]
pub fn stats_to_proto(stats: SalesStats) -> proto::GetSalesStatsResponse {
    proto::GetSalesStatsResponse {
        total_sales: stats.total_sales.as_minor(),
        order_count: stats.order_count,
        average_order_value: stats.average_order_value.as_minor(),
        daily: stats.daily.into_iter().map(daily_to_proto).collect(),
        top_products: stats
            .top_products
            .into_iter()
            .map(product_sales_to_proto)
            .collect(),
        top_categories: stats
            .top_categories
            .into_iter()
            .map(category_sales_to_proto)
            .collect(),
    }
}

fn daily_to_proto(daily: DailySales) -> proto::DailySales {
    proto::DailySales {
        date: daily.date.to_string(),
        total: daily.total.as_minor(),
        order_count: daily.order_count,
    }
}

fn product_sales_to_proto(line: ProductSales) -> proto::ProductSales {
    proto::ProductSales {
        product_id: line.product_id.to_string(),
        product_name: line.product_name,
        quantity_sold: line.quantity_sold,
        revenue: line.revenue.as_minor(),
    }
}

fn category_sales_to_proto(line: CategorySales) -> proto::CategorySales {
    proto::CategorySales {
        category_id: line.category_id.to_string(),
        category_name: line.category_name,
        quantity_sold: line.quantity_sold,
        revenue: line.revenue.as_minor(),
    }
}
