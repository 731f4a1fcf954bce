//! Cart repository.
//!
//! Rows are keyed by (user, product); the upsert replaces quantity rather
//! than accumulating it.

use sqlx::PgPool;
use sqlx::Row;

use tiendita_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::{CartItem, Product};

/// Repository for cart rows.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's cart lines joined with their product snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT c.user_id, c.product_id, c.quantity,
                   p.id, p.name, p.description, p.price, p.image_url,
                   p.stock, p.category_id, p.currency_code, p.created_at
            FROM cart_item c
            JOIN product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.added_at
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(CartItem {
                user_id: row.try_get("user_id")?,
                product_id: row.try_get("product_id")?,
                quantity: row.try_get("quantity")?,
                product: Product {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                    price: row.try_get("price")?,
                    image_url: row.try_get("image_url")?,
                    stock: row.try_get("stock")?,
                    category_id: row.try_get("category_id")?,
                    currency_code: row.try_get("currency_code")?,
                    created_at: row.try_get("created_at")?,
                },
            });
        }

        Ok(items)
    }

    /// Count of distinct cart rows for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM cart_item WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(row.try_get("n")?)
    }

    /// Upsert a cart row, replacing any existing quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO cart_item (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete a cart row. Idempotent: a missing row is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn delete(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_item WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
