//! The backend seam.
//!
//! Every component talks to storage through [`ShopBackend`], an explicit
//! object passed in rather than a process-wide singleton, so tests can
//! substitute the in-memory backend from [`crate::testing`]. The only
//! atomicity boundary this layer relies on is [`ShopBackend::create_order`];
//! everything else is sequential single calls.

use async_trait::async_trait;
use sqlx::PgPool;

use tiendita_core::{AddressId, AddressKind, CategoryId, OrderId, OrderStatus, ProductId, UserId};

use crate::db::{
    RepositoryError, cart::CartRepository, catalog::CatalogRepository, orders::OrderRepository,
    profile::ProfileRepository, users::UserRepository,
};
use crate::models::{
    Address, AuthUser, CartItem, Category, Currency, NewAddress, NewCategory, NewOrder,
    NewProduct, Order, OrderFilter, OrderPage, Product, ProductPatch, ProfilePatch, UserProfile,
};
use crate::reporting::{CategorySaleRow, CompletedOrder, DateRange, SoldItem};

/// Storage operations required by the store services.
///
/// Implementations must make [`create_order`](Self::create_order) a single
/// transactional unit: order plus items inserted, stock decremented with
/// overdraft rejected, and the user's cart rows cleared, or nothing at all.
#[async_trait]
pub trait ShopBackend: Send + Sync {
    // --- auth ---

    /// Resolve a bearer token to a user, `None` when unknown.
    async fn resolve_token(&self, token: &str) -> Result<Option<AuthUser>, RepositoryError>;

    // --- catalog ---

    /// List products newest-first, optionally filtered by category.
    async fn products(
        &self,
        category_id: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn insert_product(&self, new: NewProduct) -> Result<Product, RepositoryError>;

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError>;

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError>;

    /// List categories ordered by name.
    async fn categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn insert_category(&self, new: NewCategory) -> Result<Category, RepositoryError>;

    async fn update_category(
        &self,
        id: CategoryId,
        new: NewCategory,
    ) -> Result<Category, RepositoryError>;

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError>;

    /// List currencies, base currency first.
    async fn currencies(&self) -> Result<Vec<Currency>, RepositoryError>;

    // --- cart ---

    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError>;

    /// Count of distinct cart rows, not the quantity sum.
    async fn cart_count(&self, user_id: UserId) -> Result<i64, RepositoryError>;

    /// Upsert a cart row, replacing any existing quantity.
    async fn upsert_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError>;

    /// Delete a cart row; deleting a non-existent row is not an error.
    async fn delete_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError>;

    // --- profile & addresses ---

    /// Addresses of a kind for a user, default first then newest.
    async fn addresses(
        &self,
        user_id: UserId,
        kind: AddressKind,
    ) -> Result<Vec<Address>, RepositoryError>;

    async fn default_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
    ) -> Result<Option<Address>, RepositoryError>;

    async fn insert_address(&self, new: NewAddress) -> Result<Address, RepositoryError>;

    /// Unconditional delete; no guard against removing the default.
    async fn delete_address(&self, id: AddressId) -> Result<(), RepositoryError>;

    /// Make `id` the sole default among the user's addresses of `kind`,
    /// in one statement (no window with zero defaults).
    async fn set_default_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
        id: AddressId,
    ) -> Result<(), RepositoryError>;

    async fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, RepositoryError>;

    async fn update_profile(
        &self,
        user_id: UserId,
        patch: ProfilePatch,
    ) -> Result<UserProfile, RepositoryError>;

    // --- orders ---

    /// The atomic order-creation operation. See the trait docs.
    async fn create_order(&self, new: NewOrder) -> Result<OrderId, RepositoryError>;

    /// A user's own orders, newest first, with items and tracking.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Admin listing with status/date filters and pagination.
    async fn list_orders(&self, filter: OrderFilter) -> Result<OrderPage, RepositoryError>;

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError>;

    // --- reporting reads ---

    /// Completed orders (date, total) in the inclusive range.
    async fn completed_orders_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<CompletedOrder>, RepositoryError>;

    /// Order items in the range, for top-product aggregation.
    async fn order_items_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<SoldItem>, RepositoryError>;

    /// category -> product -> order_item join rows in the range, for
    /// top-category aggregation.
    async fn category_sales_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<CategorySaleRow>, RepositoryError>;
}

/// `PostgreSQL` implementation of [`ShopBackend`].
#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Create a backend over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ShopBackend for PgBackend {
    async fn resolve_token(&self, token: &str) -> Result<Option<AuthUser>, RepositoryError> {
        UserRepository::new(&self.pool).resolve_token(token).await
    }

    async fn products(
        &self,
        category_id: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        CatalogRepository::new(&self.pool).products(category_id).await
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        CatalogRepository::new(&self.pool).product(id).await
    }

    async fn insert_product(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        CatalogRepository::new(&self.pool).insert_product(&new).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError> {
        CatalogRepository::new(&self.pool)
            .update_product(id, &patch)
            .await
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        CatalogRepository::new(&self.pool).delete_product(id).await
    }

    async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        CatalogRepository::new(&self.pool).categories().await
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category, RepositoryError> {
        CatalogRepository::new(&self.pool).insert_category(&new).await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        new: NewCategory,
    ) -> Result<Category, RepositoryError> {
        CatalogRepository::new(&self.pool)
            .update_category(id, &new)
            .await
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        CatalogRepository::new(&self.pool).delete_category(id).await
    }

    async fn currencies(&self) -> Result<Vec<Currency>, RepositoryError> {
        CatalogRepository::new(&self.pool).currencies().await
    }

    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        CartRepository::new(&self.pool).items(user_id).await
    }

    async fn cart_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        CartRepository::new(&self.pool).count(user_id).await
    }

    async fn upsert_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        CartRepository::new(&self.pool)
            .upsert(user_id, product_id, quantity)
            .await
    }

    async fn delete_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        CartRepository::new(&self.pool).delete(user_id, product_id).await
    }

    async fn addresses(
        &self,
        user_id: UserId,
        kind: AddressKind,
    ) -> Result<Vec<Address>, RepositoryError> {
        ProfileRepository::new(&self.pool).addresses(user_id, kind).await
    }

    async fn default_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
    ) -> Result<Option<Address>, RepositoryError> {
        ProfileRepository::new(&self.pool)
            .default_address(user_id, kind)
            .await
    }

    async fn insert_address(&self, new: NewAddress) -> Result<Address, RepositoryError> {
        ProfileRepository::new(&self.pool).insert_address(&new).await
    }

    async fn delete_address(&self, id: AddressId) -> Result<(), RepositoryError> {
        ProfileRepository::new(&self.pool).delete_address(id).await
    }

    async fn set_default_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
        id: AddressId,
    ) -> Result<(), RepositoryError> {
        ProfileRepository::new(&self.pool)
            .set_default_address(user_id, kind, id)
            .await
    }

    async fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        ProfileRepository::new(&self.pool).profile(user_id).await
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        patch: ProfilePatch,
    ) -> Result<UserProfile, RepositoryError> {
        ProfileRepository::new(&self.pool)
            .update_profile(user_id, &patch)
            .await
    }

    async fn create_order(&self, new: NewOrder) -> Result<OrderId, RepositoryError> {
        OrderRepository::new(&self.pool).create(&new).await
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).for_user(user_id).await
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<OrderPage, RepositoryError> {
        OrderRepository::new(&self.pool).list(&filter).await
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool).update_status(id, status).await
    }

    async fn completed_orders_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<CompletedOrder>, RepositoryError> {
        OrderRepository::new(&self.pool).completed_in_range(range).await
    }

    async fn order_items_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<SoldItem>, RepositoryError> {
        OrderRepository::new(&self.pool).items_in_range(range).await
    }

    async fn category_sales_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<CategorySaleRow>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .category_sales_in_range(range)
            .await
    }
}
