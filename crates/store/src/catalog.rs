//! Catalog reads, admin catalog mutations, and currency conversion.

use tracing::instrument;

use tiendita_core::{CategoryId, Price, ProductId};

use crate::backend::ShopBackend;
use crate::error::{Result, StoreError};
use crate::models::{Category, Currency, NewCategory, NewProduct, Product, ProductPatch};

/// Product, category and currency operations.
pub struct CatalogService<'a> {
    backend: &'a dyn ShopBackend,
}

impl<'a> CatalogService<'a> {
    /// Create a catalog service over a backend.
    #[must_use]
    pub const fn new(backend: &'a dyn ShopBackend) -> Self {
        Self { backend }
    }

    /// Products newest-first, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the read fails.
    pub async fn products(&self, category_id: Option<CategoryId>) -> Result<Vec<Product>> {
        Ok(self.backend.products(category_id).await?)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the product doesn't exist.
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        self.backend
            .product(id)
            .await?
            .ok_or_else(|| StoreError::NotFound("product not found".to_string()))
    }

    /// Categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the read fails.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.backend.categories().await?)
    }

    /// Currencies, base first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the read fails.
    pub async fn currencies(&self) -> Result<Vec<Currency>> {
        Ok(self.backend.currencies().await?)
    }

    // --- admin mutations ---

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidArgument` for a blank name, negative
    /// price or negative stock.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
        if new.name.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "product name must not be blank".to_string(),
            ));
        }
        if new.price < Price::ZERO {
            return Err(StoreError::InvalidArgument(
                "price must not be negative".to_string(),
            ));
        }
        if new.stock < 0 {
            return Err(StoreError::InvalidArgument(
                "stock must not be negative".to_string(),
            ));
        }

        Ok(self.backend.insert_product(new).await?)
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the product doesn't exist.
    #[instrument(skip(self, patch), fields(id = %id))]
    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        if let Some(price) = patch.price
            && price < Price::ZERO
        {
            return Err(StoreError::InvalidArgument(
                "price must not be negative".to_string(),
            ));
        }
        if let Some(stock) = patch.stock
            && stock < 0
        {
            return Err(StoreError::InvalidArgument(
                "stock must not be negative".to_string(),
            ));
        }

        Ok(self.backend.update_product(id, patch).await?)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the product doesn't exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        Ok(self.backend.delete_product(id).await?)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidArgument` for a blank name and
    /// `StoreError::Backend` on a name conflict.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_category(&self, new: NewCategory) -> Result<Category> {
        if new.name.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "category name must not be blank".to_string(),
            ));
        }

        Ok(self.backend.insert_category(new).await?)
    }

    /// Rename/redescribe a category.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the category doesn't exist.
    #[instrument(skip(self, new), fields(id = %id))]
    pub async fn update_category(&self, id: CategoryId, new: NewCategory) -> Result<Category> {
        if new.name.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "category name must not be blank".to_string(),
            ));
        }

        Ok(self.backend.update_category(id, new).await?)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the category doesn't exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        Ok(self.backend.delete_category(id).await?)
    }
}

/// Convert `price` from one currency to another through the base rate.
///
/// Rates are expressed as units of the currency per unit of the base.
/// When either code is missing from `currencies`, or the codes are equal,
/// the price is returned unchanged rather than guessed at.
#[must_use]
pub fn convert_price(price: Price, from: &str, to: &str, currencies: &[Currency]) -> Price {
    if from == to {
        return price;
    }

    let Some(from_currency) = currencies.iter().find(|c| c.code == from) else {
        return price;
    };
    let Some(to_currency) = currencies.iter().find(|c| c.code == to) else {
        return price;
    };
    if from_currency.rate <= 0.0 {
        return price;
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let converted = ((price.as_minor() as f64 / from_currency.rate) * to_currency.rate).round();
    Price::from_minor(converted as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currencies() -> Vec<Currency> {
        vec![
            Currency {
                code: "EUR".to_string(),
                name: "Euro".to_string(),
                symbol: "\u{20ac}".to_string(),
                rate: 1.0,
                is_base: true,
            },
            Currency {
                code: "USD".to_string(),
                name: "US Dollar".to_string(),
                symbol: "$".to_string(),
                rate: 1.10,
                is_base: false,
            },
            Currency {
                code: "GBP".to_string(),
                name: "Pound Sterling".to_string(),
                symbol: "\u{a3}".to_string(),
                rate: 0.85,
                is_base: false,
            },
        ]
    }

    #[test]
    fn test_convert_through_base() {
        let usd = convert_price(Price::from_minor(1000), "EUR", "USD", &currencies());
        assert_eq!(usd, Price::from_minor(1100));

        let eur = convert_price(Price::from_minor(1100), "USD", "EUR", &currencies());
        assert_eq!(eur, Price::from_minor(1000));
    }

    #[test]
    fn test_convert_cross_rate_rounds() {
        // 10.00 USD -> EUR -> GBP: 1000 / 1.10 * 0.85 = 772.7..., rounds to 773
        let gbp = convert_price(Price::from_minor(1000), "USD", "GBP", &currencies());
        assert_eq!(gbp, Price::from_minor(773));
    }

    #[test]
    fn test_unknown_code_is_identity() {
        let price = Price::from_minor(500);
        assert_eq!(convert_price(price, "EUR", "XXX", &currencies()), price);
        assert_eq!(convert_price(price, "XXX", "EUR", &currencies()), price);
    }

    #[test]
    fn test_same_code_is_identity() {
        let price = Price::from_minor(500);
        assert_eq!(convert_price(price, "EUR", "EUR", &currencies()), price);
    }
}
