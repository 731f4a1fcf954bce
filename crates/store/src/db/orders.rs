//! Order repository.
//!
//! Order creation is the one multi-statement transaction in the store:
//! the order row, its item snapshots, the stock decrements, and the cart
//! wipe commit together or not at all.

use std::collections::HashMap;

use sqlx::PgPool;
use sqlx::Row;
use sqlx::postgres::PgRow;

use tiendita_core::{OrderId, OrderStatus, UserId};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderFilter, OrderItem, OrderPage, OrderTracking};
use crate::reporting::{CategorySaleRow, CompletedOrder, DateRange, SoldItem};

/// Repository for orders, their items, and reporting reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order atomically from a cart snapshot.
    ///
    /// Within one transaction: inserts the order row (status pending),
    /// decrements stock per line with overdraft rejected, inserts the item
    /// snapshots, and clears the user's cart rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InsufficientStock` when any line would
    /// drive stock negative; the whole transaction rolls back.
    pub async fn create(&self, new: &NewOrder) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r"
            INSERT INTO orders (user_id, status, total_amount, shipping_address_id, billing_address_id)
            VALUES ($1, 'pending', $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(new.user_id)
        .bind(new.total())
        .bind(new.shipping_address_id)
        .bind(new.billing_address_id)
        .fetch_one(&mut *tx)
        .await?;
        let order_id: OrderId = row.try_get("id")?;

        for line in &new.lines {
            let result = sqlx::query(
                "UPDATE product SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::InsufficientStock);
            }

            sqlx::query(
                r"
                INSERT INTO order_item (order_id, product_id, product_name, quantity, price_at_time)
                SELECT $1, id, name, $3, $4 FROM product WHERE id = $2
                ",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_item WHERE user_id = $1")
            .bind(new.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(order_id)
    }

    /// A user's own orders, newest first, with items and tracking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the queries fail.
    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, status, total_amount, created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.hydrate(rows).await
    }

    /// Admin listing with optional status and date filters, paginated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the queries fail.
    pub async fn list(&self, filter: &OrderFilter) -> Result<OrderPage, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, status, total_amount, created_at, updated_at
            FROM orders
            WHERE ($1::order_status IS NULL OR status = $1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            ",
        )
        .bind(filter.status)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(self.pool)
        .await?;

        let count_row = sqlx::query(
            r"
            SELECT COUNT(*) AS n
            FROM orders
            WHERE ($1::order_status IS NULL OR status = $1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
            ",
        )
        .bind(filter.status)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(self.pool)
        .await?;
        let total_count: i64 = count_row.try_get("n")?;

        let orders = self.hydrate(rows).await?;

        Ok(OrderPage {
            orders,
            total_count,
        })
    }

    /// Set an order's status and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query(
            r"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, status, total_amount, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut orders = self.hydrate(vec![row]).await?;
        orders.pop().ok_or(RepositoryError::NotFound)
    }

    /// Delivered orders (date, total) inside the inclusive range.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn completed_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<CompletedOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, CompletedOrder>(
            r"
            SELECT created_at, total_amount
            FROM orders
            WHERE status = 'delivered' AND created_at >= $1 AND created_at <= $2
            ",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Order item snapshots inside the range, ordered by order date so
    /// aggregation tie-breaks are stable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<SoldItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, SoldItem>(
            r"
            SELECT i.product_id, i.product_name, i.quantity, i.price_at_time
            FROM order_item i
            JOIN orders o ON o.id = i.order_id
            WHERE o.created_at >= $1 AND o.created_at <= $2
            ORDER BY o.created_at, i.id
            ",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Item rows joined up to their product's category, inside the range.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_sales_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<CategorySaleRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategorySaleRow>(
            r"
            SELECT p.category_id, c.name AS category_name, i.quantity, i.price_at_time
            FROM order_item i
            JOIN orders o ON o.id = i.order_id
            JOIN product p ON p.id = i.product_id
            JOIN category c ON c.id = p.category_id
            WHERE o.created_at >= $1 AND o.created_at <= $2
            ORDER BY o.created_at, i.id
            ",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Attach items and tracking to bare order rows, preserving row order.
    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = Vec::with_capacity(rows.len());
        // Bound as uuid[]; the newtype has no array encoding.
        let mut ids: Vec<uuid::Uuid> = Vec::with_capacity(rows.len());
        for row in rows {
            let id: OrderId = row.try_get("id")?;
            ids.push(id.as_uuid());
            orders.push(Order {
                id,
                user_id: row.try_get("user_id")?,
                status: row.try_get("status")?,
                total_amount: row.try_get("total_amount")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
                items: Vec::new(),
                tracking: None,
            });
        }

        if orders.is_empty() {
            return Ok(orders);
        }

        let mut index: HashMap<OrderId, usize> = HashMap::with_capacity(orders.len());
        for (i, order) in orders.iter().enumerate() {
            index.insert(order.id, i);
        }

        let item_rows = sqlx::query(
            r"
            SELECT order_id, id, product_id, product_name, quantity, price_at_time
            FROM order_item
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        for row in item_rows {
            let order_id: OrderId = row.try_get("order_id")?;
            if let Some(&i) = index.get(&order_id) {
                orders[i].items.push(OrderItem {
                    id: row.try_get("id")?,
                    product_id: row.try_get("product_id")?,
                    product_name: row.try_get("product_name")?,
                    quantity: row.try_get("quantity")?,
                    price_at_time: row.try_get("price_at_time")?,
                });
            }
        }

        let tracking_rows = sqlx::query(
            r"
            SELECT order_id, tracking_number, carrier, status, location
            FROM order_tracking
            WHERE order_id = ANY($1)
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        for row in tracking_rows {
            let order_id: OrderId = row.try_get("order_id")?;
            if let Some(&i) = index.get(&order_id) {
                orders[i].tracking = Some(OrderTracking {
                    tracking_number: row.try_get("tracking_number")?,
                    carrier: row.try_get("carrier")?,
                    status: row.try_get("status")?,
                    location: row.try_get("location")?,
                });
            }
        }

        Ok(orders)
    }
}
