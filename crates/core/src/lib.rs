//! Tiendita Core - Shared types library.
//!
//! This crate provides common types used across all Tiendita components:
//! - `store` - Domain library (catalog, cart, checkout, profiles, reporting)
//! - `grpc` - gRPC facade re-exposing store operations
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no
//! network clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
