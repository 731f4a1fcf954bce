//! User repository: bearer-token resolution.
//!
//! Tokens are opaque strings issued out of band (see the seed command);
//! this layer only looks them up.

use sqlx::PgPool;

use tiendita_core::UserId;

use super::RepositoryError;
use crate::models::AuthUser;

/// Repository for user lookups.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

#[derive(sqlx::FromRow)]
struct AuthUserRow {
    id: UserId,
    email: String,
    is_admin: bool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a bearer token to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<AuthUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AuthUserRow>(
            r"
            SELECT id, email, is_admin
            FROM user_account
            WHERE api_token = $1
            ",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| AuthUser {
            id: r.id,
            email: r.email,
            is_admin: r.is_admin,
        }))
    }
}
