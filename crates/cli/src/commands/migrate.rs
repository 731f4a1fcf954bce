//! Database migration command.
//!
//! Migration files live in `crates/store/migrations/`. The server never
//! runs them automatically; this command is the only writer of schema.

use tiendita_store::config::StoreConfig;
use tiendita_store::db;

/// Run pending migrations against the configured database.
///
/// # Errors
///
/// Returns an error if configuration is missing or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../store/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
