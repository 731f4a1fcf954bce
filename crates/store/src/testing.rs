//! In-memory [`ShopBackend`] for tests.
//!
//! Mirrors the Postgres backend's observable behavior, including the
//! all-or-nothing order creation, over plain maps behind a mutex. Exposed
//! to downstream crates through the `test-utils` feature.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tiendita_core::{
    AddressId, AddressKind, CategoryId, OrderId, OrderItemId, OrderStatus, PaymentMode, Price,
    ProductId, UserId,
};

use crate::backend::ShopBackend;
use crate::db::RepositoryError;
use crate::models::{
    Address, AuthUser, BillingSnapshot, CartItem, Category, Currency, NewAddress, NewCategory,
    NewOrder, NewProduct, Order, OrderFilter, OrderItem, OrderLine, OrderPage, Product,
    ProductPatch, ProfilePatch, UserProfile,
};
use crate::reporting::{CategorySaleRow, CompletedOrder, DateRange, SoldItem};

struct StoredUser {
    id: UserId,
    token: String,
    email: String,
    is_admin: bool,
}

struct CartRow {
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
    seq: u64,
}

#[derive(Default)]
struct State {
    users: Vec<StoredUser>,
    profiles: HashMap<UserId, UserProfile>,
    categories: Vec<Category>,
    products: Vec<Product>,
    currencies: Vec<Currency>,
    cart: Vec<CartRow>,
    addresses: Vec<Address>,
    orders: Vec<Order>,
    seq: u64,
}

/// In-memory backend for exercising the services without a database.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a user resolvable by `token`. Returns the new user's id.
    pub fn register_user(&self, token: &str, email: &str, is_admin: bool) -> UserId {
        let id = UserId::generate();
        self.lock().users.push(StoredUser {
            id,
            token: token.to_string(),
            email: email.to_string(),
            is_admin,
        });
        id
    }

    /// Add a category. Returns its id.
    pub fn add_category(&self, name: &str) -> CategoryId {
        let id = CategoryId::generate();
        self.lock().categories.push(Category {
            id,
            name: name.to_string(),
            description: String::new(),
        });
        id
    }

    /// Add a product in a throwaway category. Returns its id.
    pub fn add_product(&self, name: &str, price_minor: i64, stock: i32) -> ProductId {
        let category_id = self.add_category(&format!("cat-{name}"));
        self.add_product_in(name, price_minor, stock, category_id)
    }

    /// Add a product in an existing category. Returns its id.
    pub fn add_product_in(
        &self,
        name: &str,
        price_minor: i64,
        stock: i32,
        category_id: CategoryId,
    ) -> ProductId {
        let id = ProductId::generate();
        self.lock().products.push(Product {
            id,
            name: name.to_string(),
            description: String::new(),
            price: Price::from_minor(price_minor),
            image_url: String::new(),
            stock,
            category_id,
            currency_code: "EUR".to_string(),
            created_at: Utc::now(),
        });
        id
    }

    /// Add a currency row.
    pub fn add_currency(&self, code: &str, symbol: &str, rate: f64, is_base: bool) {
        self.lock().currencies.push(Currency {
            code: code.to_string(),
            name: code.to_string(),
            symbol: symbol.to_string(),
            rate,
            is_base,
        });
    }

    /// Put a complete billing snapshot on the user's profile, creating the
    /// profile if needed.
    pub fn set_billing_snapshot(&self, user_id: UserId, snapshot: BillingSnapshot) {
        let mut state = self.lock();
        let email = state
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.email.clone())
            .unwrap_or_default();
        let profile = state
            .profiles
            .entry(user_id)
            .or_insert_with(|| empty_profile(user_id, email));
        profile.billing_address = Some(snapshot);
    }

    /// Insert a pre-built order directly, for reporting tests. The order's
    /// `created_at` can be anywhere in the past.
    pub fn push_order(
        &self,
        user_id: UserId,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        lines: &[OrderLine],
    ) -> OrderId {
        let mut state = self.lock();
        let id = OrderId::generate();
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|line| {
                let product_name = state
                    .products
                    .iter()
                    .find(|p| p.id == line.product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                OrderItem {
                    id: OrderItemId::generate(),
                    product_id: line.product_id,
                    product_name,
                    quantity: line.quantity,
                    price_at_time: line.price,
                }
            })
            .collect();
        let total_amount = lines
            .iter()
            .fold(Price::ZERO, |acc, l| acc.plus(l.price.times(l.quantity)));
        state.orders.push(Order {
            id,
            user_id,
            status,
            total_amount,
            created_at,
            updated_at: created_at,
            items,
            tracking: None,
        });
        id
    }

    fn next_seq(state: &mut State) -> u64 {
        state.seq += 1;
        state.seq
    }
}

fn empty_profile(user_id: UserId, email: String) -> UserProfile {
    UserProfile {
        user_id,
        email,
        tax_id: None,
        company_name: None,
        phone: None,
        phone_prefix: None,
        payment_mode: PaymentMode::Prepaid,
        billing_address: None,
    }
}

#[async_trait]
impl ShopBackend for MemoryBackend {
    async fn resolve_token(&self, token: &str) -> Result<Option<AuthUser>, RepositoryError> {
        Ok(self.lock().users.iter().find(|u| u.token == token).map(|u| AuthUser {
            id: u.id,
            email: u.email.clone(),
            is_admin: u.is_admin,
        }))
    }

    async fn products(
        &self,
        category_id: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let state = self.lock();
        Ok(state
            .products
            .iter()
            .rev()
            .filter(|p| category_id.is_none_or(|c| p.category_id == c))
            .cloned()
            .collect())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.lock().products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let product = Product {
            id: ProductId::generate(),
            name: new.name,
            description: new.description,
            price: new.price,
            image_url: new.image_url,
            stock: new.stock,
            category_id: new.category_id,
            currency_code: new.currency_code,
            created_at: Utc::now(),
        };
        self.lock().products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.lock();
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(image_url) = patch.image_url {
            product.image_url = image_url;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        if let Some(category_id) = patch.category_id {
            product.category_id = category_id;
        }
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories = self.lock().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category, RepositoryError> {
        let mut state = self.lock();
        if state.categories.iter().any(|c| c.name == new.name) {
            return Err(RepositoryError::Conflict(
                "category name already exists".to_string(),
            ));
        }
        let category = Category {
            id: CategoryId::generate(),
            name: new.name,
            description: new.description,
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        new: NewCategory,
    ) -> Result<Category, RepositoryError> {
        let mut state = self.lock();
        let category = state
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        category.name = new.name;
        category.description = new.description;
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        if state.categories.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn currencies(&self) -> Result<Vec<Currency>, RepositoryError> {
        let mut currencies = self.lock().currencies.clone();
        currencies.sort_by(|a, b| (Reverse(a.is_base), &a.code).cmp(&(Reverse(b.is_base), &b.code)));
        Ok(currencies)
    }

    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let state = self.lock();
        let mut rows: Vec<&CartRow> = state.cart.iter().filter(|r| r.user_id == user_id).collect();
        rows.sort_by_key(|r| r.seq);
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                state
                    .products
                    .iter()
                    .find(|p| p.id == row.product_id)
                    .map(|product| CartItem {
                        user_id: row.user_id,
                        product_id: row.product_id,
                        quantity: row.quantity,
                        product: product.clone(),
                    })
            })
            .collect())
    }

    async fn cart_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = self.lock().cart.iter().filter(|r| r.user_id == user_id).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn upsert_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        if let Some(row) = state
            .cart
            .iter_mut()
            .find(|r| r.user_id == user_id && r.product_id == product_id)
        {
            row.quantity = quantity;
            return Ok(());
        }
        let seq = Self::next_seq(&mut state);
        state.cart.push(CartRow {
            user_id,
            product_id,
            quantity,
            seq,
        });
        Ok(())
    }

    async fn delete_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        self.lock()
            .cart
            .retain(|r| !(r.user_id == user_id && r.product_id == product_id));
        Ok(())
    }

    async fn addresses(
        &self,
        user_id: UserId,
        kind: AddressKind,
    ) -> Result<Vec<Address>, RepositoryError> {
        let state = self.lock();
        let mut indexed: Vec<(usize, &Address)> = state
            .addresses
            .iter()
            .enumerate()
            .filter(|(_, a)| a.user_id == user_id && a.kind == kind)
            .collect();
        // Default first, then newest (later insert) first.
        indexed.sort_by_key(|(i, a)| (!a.is_default, Reverse(*i)));
        Ok(indexed.into_iter().map(|(_, a)| a.clone()).collect())
    }

    async fn default_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
    ) -> Result<Option<Address>, RepositoryError> {
        Ok(self
            .lock()
            .addresses
            .iter()
            .find(|a| a.user_id == user_id && a.kind == kind && a.is_default)
            .cloned())
    }

    async fn insert_address(&self, new: NewAddress) -> Result<Address, RepositoryError> {
        let mut state = self.lock();
        if new.is_default {
            for address in &mut state.addresses {
                if address.user_id == new.user_id && address.kind == new.kind {
                    address.is_default = false;
                }
            }
        }
        let address = Address {
            id: AddressId::generate(),
            user_id: new.user_id,
            kind: new.kind,
            name: new.name,
            line1: new.line1,
            line2: new.line2,
            city: new.city,
            state: new.state,
            postal_code: new.postal_code,
            country: new.country,
            is_default: new.is_default,
            created_at: Utc::now(),
        };
        state.addresses.push(address.clone());
        Ok(address)
    }

    async fn delete_address(&self, id: AddressId) -> Result<(), RepositoryError> {
        self.lock().addresses.retain(|a| a.id != id);
        Ok(())
    }

    async fn set_default_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
        id: AddressId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let owned = state
            .addresses
            .iter()
            .any(|a| a.id == id && a.user_id == user_id && a.kind == kind);
        if !owned {
            return Err(RepositoryError::NotFound);
        }
        for address in &mut state.addresses {
            if address.user_id == user_id && address.kind == kind {
                address.is_default = address.id == id;
            }
        }
        Ok(())
    }

    async fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.lock().profiles.get(&user_id).cloned())
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        patch: ProfilePatch,
    ) -> Result<UserProfile, RepositoryError> {
        let mut state = self.lock();
        let email = state
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.email.clone())
            .unwrap_or_default();
        let current = state
            .profiles
            .entry(user_id)
            .or_insert_with(|| empty_profile(user_id, email));
        let updated = current.patched(&patch);
        *current = updated.clone();
        Ok(updated)
    }

    async fn create_order(&self, new: NewOrder) -> Result<OrderId, RepositoryError> {
        let mut state = self.lock();

        // All-or-nothing: verify every line before mutating anything.
        for line in &new.lines {
            let product = state
                .products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or(RepositoryError::NotFound)?;
            if product.stock < line.quantity {
                return Err(RepositoryError::InsufficientStock);
            }
        }

        let mut items = Vec::with_capacity(new.lines.len());
        for line in &new.lines {
            if let Some(product) = state.products.iter_mut().find(|p| p.id == line.product_id) {
                product.stock -= line.quantity;
                items.push(OrderItem {
                    id: OrderItemId::generate(),
                    product_id: line.product_id,
                    product_name: product.name.clone(),
                    quantity: line.quantity,
                    price_at_time: line.price,
                });
            }
        }

        state.cart.retain(|r| r.user_id != new.user_id);

        let id = OrderId::generate();
        let now = Utc::now();
        let total_amount = new.total();
        state.orders.push(Order {
            id,
            user_id: new.user_id,
            status: OrderStatus::Pending,
            total_amount,
            created_at: now,
            updated_at: now,
            items,
            tracking: None,
        });

        Ok(id)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<OrderPage, RepositoryError> {
        let state = self.lock();
        let mut matched: Vec<&Order> = state
            .orders
            .iter()
            .filter(|o| {
                filter.status.is_none_or(|s| o.status == s)
                    && filter.start_date.is_none_or(|d| o.created_at >= d)
                    && filter.end_date.is_none_or(|d| o.created_at <= d)
            })
            .collect();
        matched.sort_by_key(|o| Reverse(o.created_at));

        let total_count = i64::try_from(matched.len()).unwrap_or(i64::MAX);
        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(0);
        let orders = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(OrderPage {
            orders,
            total_count,
        })
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut state = self.lock();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(RepositoryError::NotFound)?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn completed_orders_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<CompletedOrder>, RepositoryError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .filter(|o| {
                o.status.is_completed() && o.created_at >= range.start && o.created_at <= range.end
            })
            .map(|o| CompletedOrder {
                created_at: o.created_at,
                total_amount: o.total_amount,
            })
            .collect())
    }

    async fn order_items_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<SoldItem>, RepositoryError> {
        let state = self.lock();
        let mut in_range: Vec<&Order> = state
            .orders
            .iter()
            .filter(|o| o.created_at >= range.start && o.created_at <= range.end)
            .collect();
        in_range.sort_by_key(|o| o.created_at);
        Ok(in_range
            .into_iter()
            .flat_map(|o| {
                o.items.iter().map(|item| SoldItem {
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    price_at_time: item.price_at_time,
                })
            })
            .collect())
    }

    async fn category_sales_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<CategorySaleRow>, RepositoryError> {
        let state = self.lock();
        let mut in_range: Vec<&Order> = state
            .orders
            .iter()
            .filter(|o| o.created_at >= range.start && o.created_at <= range.end)
            .collect();
        in_range.sort_by_key(|o| o.created_at);

        let mut rows = Vec::new();
        for order in in_range {
            for item in &order.items {
                let Some(product) = state.products.iter().find(|p| p.id == item.product_id)
                else {
                    continue;
                };
                let Some(category) = state
                    .categories
                    .iter()
                    .find(|c| c.id == product.category_id)
                else {
                    continue;
                };
                rows.push(CategorySaleRow {
                    category_id: category.id,
                    category_name: category.name.clone(),
                    quantity: item.quantity,
                    price_at_time: item.price_at_time,
                });
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_token() {
        let backend = MemoryBackend::new();
        let id = backend.register_user("secret", "ana@example.com", true);

        let user = backend
            .resolve_token("secret")
            .await
            .expect("lookup")
            .expect("user");
        assert_eq!(user.id, id);
        assert!(user.is_admin);

        assert!(backend.resolve_token("wrong").await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn test_create_order_is_all_or_nothing() {
        let backend = MemoryBackend::new();
        let user_id = UserId::generate();
        let plenty = backend.add_product("Plenty", 100, 10);
        let scarce = backend.add_product("Scarce", 100, 1);

        let err = backend
            .create_order(NewOrder {
                user_id,
                shipping_address_id: AddressId::generate(),
                billing_address_id: AddressId::generate(),
                lines: vec![
                    OrderLine {
                        product_id: plenty,
                        quantity: 2,
                        price: Price::from_minor(100),
                    },
                    OrderLine {
                        product_id: scarce,
                        quantity: 2,
                        price: Price::from_minor(100),
                    },
                ],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InsufficientStock));

        // The satisfiable line was not applied either.
        let product = backend.product(plenty).await.expect("read").expect("product");
        assert_eq!(product.stock, 10);
    }
}
