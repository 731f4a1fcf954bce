//! Sales reporting for the back office.
//!
//! The backend hands back flat row sets; all aggregation happens here in
//! memory. Daily buckets come from delivered orders only, while the
//! top-product and top-category boards count every order item in the range
//! regardless of order status.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tiendita_core::{CategoryId, Price, ProductId};

use crate::backend::ShopBackend;
use crate::error::{Result, StoreError};

/// Inclusive date-time range for reporting queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Build a range, rejecting an end before the start.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidArgument` when `end < start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(StoreError::InvalidArgument(
                "end date before start date".to_string(),
            ));
        }
        Ok(Self { start, end })
    }
}

/// A delivered order's date and total, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CompletedOrder {
    pub created_at: DateTime<Utc>,
    pub total_amount: Price,
}

/// One order-item snapshot inside the range.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SoldItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price_at_time: Price,
}

/// One order-item snapshot joined up to its product's category.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CategorySaleRow {
    pub category_id: CategoryId,
    pub category_name: String,
    pub quantity: i32,
    pub price_at_time: Price,
}

/// Revenue and order count for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total: Price,
    pub order_count: i64,
}

/// Aggregate line on the top-products board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue: Price,
}

/// Aggregate line on the top-categories board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySales {
    pub category_id: CategoryId,
    pub category_name: String,
    pub quantity_sold: i64,
    pub revenue: Price,
}

/// The full sales report for a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesStats {
    pub total_sales: Price,
    pub order_count: i64,
    pub average_order_value: Price,
    pub daily: Vec<DailySales>,
    pub top_products: Vec<ProductSales>,
    pub top_categories: Vec<CategorySales>,
}

/// How many lines the top-product and top-category boards carry.
const TOP_LIMIT: usize = 5;

/// Reporting reads and aggregation.
pub struct ReportingService<'a> {
    backend: &'a dyn ShopBackend,
}

impl<'a> ReportingService<'a> {
    /// Create a reporting service over a backend.
    #[must_use]
    pub const fn new(backend: &'a dyn ShopBackend) -> Self {
        Self { backend }
    }

    /// Compute the sales report for `range`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` when any of the three reads fails.
    #[instrument(skip(self), fields(start = %range.start, end = %range.end))]
    pub async fn sales_stats(&self, range: DateRange) -> Result<SalesStats> {
        let completed = self.backend.completed_orders_in_range(range).await?;
        let items = self.backend.order_items_in_range(range).await?;
        let category_rows = self.backend.category_sales_in_range(range).await?;

        let daily = aggregate_daily(&completed);
        let total_sales = completed
            .iter()
            .fold(Price::ZERO, |acc, o| acc.plus(o.total_amount));
        let order_count = i64::try_from(completed.len()).unwrap_or(i64::MAX);
        let average_order_value = if order_count == 0 {
            Price::ZERO
        } else {
            Price::from_minor(total_sales.as_minor() / order_count)
        };

        Ok(SalesStats {
            total_sales,
            order_count,
            average_order_value,
            daily,
            top_products: top_products(&items),
            top_categories: top_categories(&category_rows),
        })
    }
}

/// Bucket delivered orders by calendar day, ascending.
#[must_use]
pub fn aggregate_daily(orders: &[CompletedOrder]) -> Vec<DailySales> {
    let mut buckets: BTreeMap<NaiveDate, (Price, i64)> = BTreeMap::new();
    for order in orders {
        let entry = buckets
            .entry(order.created_at.date_naive())
            .or_insert((Price::ZERO, 0));
        entry.0 = entry.0.plus(order.total_amount);
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(date, (total, order_count))| DailySales {
            date,
            total,
            order_count,
        })
        .collect()
}

/// Top products by units sold. Ties keep first-seen order, which follows
/// order date because the backend returns rows chronologically.
#[must_use]
pub fn top_products(items: &[SoldItem]) -> Vec<ProductSales> {
    let mut index: HashMap<ProductId, usize> = HashMap::new();
    let mut lines: Vec<ProductSales> = Vec::new();

    for item in items {
        let i = *index.entry(item.product_id).or_insert_with(|| {
            lines.push(ProductSales {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity_sold: 0,
                revenue: Price::ZERO,
            });
            lines.len() - 1
        });
        lines[i].quantity_sold += i64::from(item.quantity);
        lines[i].revenue = lines[i].revenue.plus(item.price_at_time.times(item.quantity));
    }

    lines.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));
    lines.truncate(TOP_LIMIT);
    lines
}

/// Top categories by units sold, same tie-break rule as products.
#[must_use]
pub fn top_categories(rows: &[CategorySaleRow]) -> Vec<CategorySales> {
    let mut index: HashMap<CategoryId, usize> = HashMap::new();
    let mut lines: Vec<CategorySales> = Vec::new();

    for row in rows {
        let i = *index.entry(row.category_id).or_insert_with(|| {
            lines.push(CategorySales {
                category_id: row.category_id,
                category_name: row.category_name.clone(),
                quantity_sold: 0,
                revenue: Price::ZERO,
            });
            lines.len() - 1
        });
        lines[i].quantity_sold += i64::from(row.quantity);
        lines[i].revenue = lines[i].revenue.plus(row.price_at_time.times(row.quantity));
    }

    lines.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));
    lines.truncate(TOP_LIMIT);
    lines
}
