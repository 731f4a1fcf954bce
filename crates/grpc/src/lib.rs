//! Tiendita gRPC facade.
//!
//! Exposes the store services as `ShopService` and `ShopAdminService`.
//! All handlers authenticate through a bearer token in the
//! `authorization` metadata and delegate to a [`ShopBackend`] object,
//! so they run unchanged against Postgres and the in-memory test backend.
//!
//! [`ShopBackend`]: tiendita_store::ShopBackend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod convert;
pub mod services;
pub mod status;

/// Generated protobuf types and service stubs.
#[allow(clippy::pedantic)]
pub mod proto {
    tonic::include_proto!("shop.v1");
}

pub use services::admin::ShopAdminApi;
pub use services::shop::ShopApi;
