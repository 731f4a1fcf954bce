//! Catalog repository: products, categories, currencies.

use sqlx::PgPool;

use tiendita_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::{Category, Currency, NewCategory, NewProduct, Product, ProductPatch};

const PRODUCT_COLUMNS: &str = "id, name, description, price, image_url, stock, category_id, \
                               currency_code, created_at";

/// Repository for catalog reads and admin mutations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products newest-first, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products(
        &self,
        category_id: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = match category_id {
            Some(category_id) => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM product \
                     WHERE category_id = $1 ORDER BY created_at DESC"
                ))
                .bind(category_id)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY created_at DESC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(rows)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including
    /// a missing category, surfaced as a foreign-key violation).
    pub async fn insert_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO product (name, description, price, image_url, stock, category_id, currency_code) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.image_url)
        .bind(new.stock)
        .bind(new.category_id)
        .bind(&new.currency_code)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "UPDATE product SET \
               name = COALESCE($2, name), \
               description = COALESCE($3, description), \
               price = COALESCE($4, price), \
               image_url = COALESCE($5, image_url), \
               stock = COALESCE($6, stock), \
               category_id = COALESCE($7, category_id) \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.price)
        .bind(patch.image_url.as_deref())
        .bind(patch.stock)
        .bind(patch.category_id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// List categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM category ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn insert_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO category (name, description) VALUES ($1, $2) \
             RETURNING id, name, description",
        )
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("category name already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row)
    }

    /// Rename/redescribe a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn update_category(
        &self,
        id: CategoryId,
        new: &NewCategory,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(
            "UPDATE category SET name = $2, description = $3 WHERE id = $1 \
             RETURNING id, name, description",
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.description)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// List currencies, base currency first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn currencies(&self) -> Result<Vec<Currency>, RepositoryError> {
        let rows = sqlx::query_as::<_, Currency>(
            "SELECT code, name, symbol, rate, is_base FROM currency ORDER BY is_base DESC, code",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
