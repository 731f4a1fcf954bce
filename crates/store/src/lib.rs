//! Tiendita Store - domain library for the storefront backend.
//!
//! Everything user- and admin-facing goes through the [`ShopBackend`]
//! trait: the gRPC facade and the CLI construct a [`backend::PgBackend`]
//! over a `PostgreSQL` pool, while tests use the in-memory backend from
//! [`testing`]. No component talks to the database directly.
//!
//! # Modules
//!
//! - [`backend`] - The `ShopBackend` trait and its Postgres implementation
//! - [`catalog`] - Product/category/currency reads and admin mutations
//! - [`cart`] - Per-user cart with advisory stock ceilings
//! - [`checkout`] - The checkout orchestrator
//! - [`profile`] - User profile and address management
//! - [`reporting`] - Date-ranged sales aggregation for the back office
//! - [`db`] - Connection pool and sqlx repositories
//! - [`models`] - Domain entities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod profile;
pub mod reporting;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use backend::{PgBackend, ShopBackend};
pub use error::{Result, StoreError};
