//! Database operations for the store `PostgreSQL` instance.
//!
//! # Tables
//!
//! - `user_account` - Users with API tokens and the admin flag
//! - `user_profile` - One-to-one profile with embedded billing snapshot
//! - `address` - Shipping/billing addresses with per-kind default flag
//! - `category`, `product`, `currency` - Catalog
//! - `cart_item` - Composite-keyed (user, product) cart rows
//! - `orders`, `order_item`, `order_tracking` - Order history
//!   (`orders` is plural because `order` is a reserved word)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/store/migrations/` and run via:
//! ```bash
//! cargo run -p tiendita-cli -- migrate
//! ```
//!
//! All queries are runtime-checked (`sqlx::query`/`query_as`) so the
//! workspace builds without a live database.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod cart;
pub mod catalog;
pub mod orders;
pub mod profile;
pub mod users;

/// Errors from the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The targeted row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness or state conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stock decrement was rejected inside the order transaction.
    #[error("insufficient stock")]
    InsufficientStock,

    /// Stored data failed to deserialize.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
