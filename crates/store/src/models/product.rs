//! Catalog entities: products and categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tiendita_core::{CategoryId, Price, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

/// A catalog product.
///
/// `price` is the per-unit price in minor units of `currency_code`.
/// Stock is mutated only by admin operations and by order fulfillment
/// inside the order-creation transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: String,
    pub stock: i32,
    pub category_id: CategoryId,
    pub currency_code: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a product (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: String,
    pub stock: i32,
    pub category_id: CategoryId,
    pub currency_code: String,
}

/// Partial update for a product (admin). `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
    pub category_id: Option<CategoryId>,
}

/// Fields for creating a category (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}
