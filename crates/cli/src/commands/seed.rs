//! Demo data seeding.
//!
//! Idempotent: every insert is `ON CONFLICT DO NOTHING` keyed on natural
//! uniques (currency code, category name, account email), so re-running
//! the command is safe.

use sqlx::PgPool;
use sqlx::Row;

use tiendita_store::config::StoreConfig;
use tiendita_store::db;

const DEMO_ADMIN_EMAIL: &str = "admin@tiendita.test";
const DEMO_ADMIN_TOKEN: &str = "demo-admin-token";
const DEMO_USER_EMAIL: &str = "shopper@tiendita.test";
const DEMO_USER_TOKEN: &str = "demo-user-token";

/// Seed currencies, categories, products, and demo accounts.
///
/// # Errors
///
/// Returns an error if configuration is missing or an insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    seed_currencies(&pool).await?;
    seed_catalog(&pool).await?;
    seed_accounts(&pool).await?;

    tracing::info!("Seed complete");
    tracing::info!("  admin token: {DEMO_ADMIN_TOKEN}");
    tracing::info!("  user token:  {DEMO_USER_TOKEN}");
    Ok(())
}

async fn seed_currencies(pool: &PgPool) -> Result<(), sqlx::Error> {
    let currencies = [
        ("EUR", "Euro", "\u{20ac}", 1.0, true),
        ("USD", "US Dollar", "$", 1.10, false),
        ("GBP", "Pound Sterling", "\u{a3}", 0.85, false),
    ];

    for (code, name, symbol, rate, is_base) in currencies {
        sqlx::query(
            "INSERT INTO currency (code, name, symbol, rate, is_base) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (code) DO NOTHING",
        )
        .bind(code)
        .bind(name)
        .bind(symbol)
        .bind(rate)
        .bind(is_base)
        .execute(pool)
        .await?;
    }

    tracing::info!("Currencies seeded");
    Ok(())
}

async fn seed_catalog(pool: &PgPool) -> Result<(), sqlx::Error> {
    // (category, description, products: (name, description, price cents, stock))
    let catalog: &[(&str, &str, &[(&str, &str, i64, i32)])] = &[
        (
            "Pantry",
            "Oils, grains and staples",
            &[
                ("Olive oil 1L", "Extra virgin, cold pressed", 1250, 40),
                ("Arborio rice 1kg", "For risotto", 480, 120),
                ("Canned tomatoes", "Whole peeled, 400g", 150, 200),
            ],
        ),
        (
            "Beverages",
            "Coffee, tea and juice",
            &[
                ("Espresso beans 500g", "Dark roast", 890, 60),
                ("Green tea 20 bags", "Sencha", 320, 80),
            ],
        ),
        (
            "Snacks",
            "Sweet and savory",
            &[
                ("Dark chocolate 85%", "100g bar", 260, 150),
                ("Salted almonds 250g", "Roasted", 410, 90),
            ],
        ),
    ];

    for (name, description, products) in catalog {
        let row = sqlx::query(
            "INSERT INTO category (name, description) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description \
             RETURNING id",
        )
        .bind(name)
        .bind(description)
        .fetch_one(pool)
        .await?;
        let category_id: uuid::Uuid = row.try_get("id")?;

        for (product_name, product_description, price, stock) in *products {
            // No natural unique on product; skip when one of the same name
            // already exists in the category.
            sqlx::query(
                r"
                INSERT INTO product (name, description, price, stock, category_id, currency_code)
                SELECT $1, $2, $3, $4, $5, 'EUR'
                WHERE NOT EXISTS (
                    SELECT 1 FROM product WHERE name = $1 AND category_id = $5
                )
                ",
            )
            .bind(product_name)
            .bind(product_description)
            .bind(price)
            .bind(stock)
            .bind(category_id)
            .execute(pool)
            .await?;
        }
    }

    tracing::info!("Catalog seeded");
    Ok(())
}

async fn seed_accounts(pool: &PgPool) -> Result<(), sqlx::Error> {
    let accounts = [
        (DEMO_ADMIN_EMAIL, DEMO_ADMIN_TOKEN, true),
        (DEMO_USER_EMAIL, DEMO_USER_TOKEN, false),
    ];

    for (email, token, is_admin) in accounts {
        sqlx::query(
            "INSERT INTO user_account (email, api_token, is_admin) \
             VALUES ($1, $2, $3) ON CONFLICT (email) DO NOTHING",
        )
        .bind(email)
        .bind(token)
        .bind(is_admin)
        .execute(pool)
        .await?;
    }

    tracing::info!("Demo accounts seeded");
    Ok(())
}
