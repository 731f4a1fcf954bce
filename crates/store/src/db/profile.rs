//! Profile and address repository.

use sqlx::PgPool;
use sqlx::Row;

use tiendita_core::{AddressId, AddressKind, UserId};

use super::RepositoryError;
use crate::models::{Address, BillingSnapshot, NewAddress, ProfilePatch, UserProfile};

const ADDRESS_COLUMNS: &str = "id, user_id, kind, name, line1, line2, city, state, \
                               postal_code, country, is_default, created_at";

/// Repository for user profiles and their addresses.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Addresses of one kind for a user, default first then newest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn addresses(
        &self,
        user_id: UserId,
        kind: AddressKind,
    ) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM address \
             WHERE user_id = $1 AND kind = $2 \
             ORDER BY is_default DESC, created_at DESC"
        ))
        .bind(user_id)
        .bind(kind)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// The default address of one kind, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn default_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM address \
             WHERE user_id = $1 AND kind = $2 AND is_default"
        ))
        .bind(user_id)
        .bind(kind)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Insert an address. When flagged default, other defaults of the same
    /// kind are cleared first within the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn insert_address(&self, new: &NewAddress) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if new.is_default {
            sqlx::query(
                "UPDATE address SET is_default = FALSE WHERE user_id = $1 AND kind = $2",
            )
            .bind(new.user_id)
            .bind(new.kind)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, Address>(&format!(
            "INSERT INTO address \
               (user_id, kind, name, line1, line2, city, state, postal_code, country, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(new.user_id)
        .bind(new.kind)
        .bind(&new.name)
        .bind(&new.line1)
        .bind(new.line2.as_deref())
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.postal_code)
        .bind(&new.country)
        .bind(new.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row)
    }

    /// Delete an address unconditionally. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn delete_address(&self, id: AddressId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM address WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Make `id` the sole default among the user's addresses of `kind`.
    ///
    /// One statement sets the flag on the target and clears it everywhere
    /// else, so there is no window with zero defaults.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the target address doesn't
    /// belong to the user (no row of that kind flipped to default).
    pub async fn set_default_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
        id: AddressId,
    ) -> Result<(), RepositoryError> {
        let row = sqlx::query(
            r"
            WITH flipped AS (
                UPDATE address
                SET is_default = (id = $3)
                WHERE user_id = $1 AND kind = $2
                RETURNING id, is_default
            )
            SELECT COUNT(*) FILTER (WHERE is_default) AS defaults FROM flipped
            ",
        )
        .bind(user_id)
        .bind(kind)
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        let defaults: i64 = row.try_get("defaults")?;
        if defaults == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Load a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the embedded billing
    /// snapshot fails to deserialize.
    pub async fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT p.user_id, u.email, p.tax_id, p.company_name, p.phone,
                   p.phone_prefix, p.payment_mode, p.billing_address
            FROM user_profile p
            JOIN user_account u ON u.id = p.user_id
            WHERE p.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Self::profile_from_row(&r)).transpose()
    }

    /// Apply a merge-patch to a profile, creating an empty profile row for
    /// the user first if none exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        patch: &ProfilePatch,
    ) -> Result<UserProfile, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO user_profile (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(
            r"
            SELECT p.user_id, u.email, p.tax_id, p.company_name, p.phone,
                   p.phone_prefix, p.payment_mode, p.billing_address
            FROM user_profile p
            JOIN user_account u ON u.id = p.user_id
            WHERE p.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let current = Self::profile_from_row(&row)?;
        let updated = current.patched(patch);

        let billing_json = updated
            .billing_address
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("failed to serialize snapshot: {e}"))
            })?;

        sqlx::query(
            r"
            UPDATE user_profile
            SET tax_id = $2, company_name = $3, phone = $4, phone_prefix = $5,
                payment_mode = $6, billing_address = $7
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(updated.tax_id.as_deref())
        .bind(updated.company_name.as_deref())
        .bind(updated.phone.as_deref())
        .bind(updated.phone_prefix.as_deref())
        .bind(updated.payment_mode)
        .bind(billing_json)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    fn profile_from_row(row: &sqlx::postgres::PgRow) -> Result<UserProfile, RepositoryError> {
        let billing_address = row
            .try_get::<Option<serde_json::Value>, _>("billing_address")?
            .map(|value| {
                serde_json::from_value::<BillingSnapshot>(value).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid billing snapshot: {e}"))
                })
            })
            .transpose()?;

        Ok(UserProfile {
            user_id: row.try_get("user_id")?,
            email: row.try_get("email")?,
            tax_id: row.try_get("tax_id")?,
            company_name: row.try_get("company_name")?,
            phone: row.try_get("phone")?,
            phone_prefix: row.try_get("phone_prefix")?,
            payment_mode: row.try_get("payment_mode")?,
            billing_address,
        })
    }
}
