//! Domain entities persisted by the backend.

pub mod address;
pub mod cart;
pub mod currency;
pub mod order;
pub mod product;
pub mod profile;
pub mod user;

pub use address::{Address, NewAddress};
pub use cart::CartItem;
pub use currency::Currency;
pub use order::{NewOrder, Order, OrderFilter, OrderItem, OrderLine, OrderPage, OrderTracking};
pub use product::{Category, NewCategory, NewProduct, Product, ProductPatch};
pub use profile::{BillingPatch, BillingSnapshot, ProfilePatch, UserProfile};
pub use user::AuthUser;
