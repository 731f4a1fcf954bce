//! RPC handler implementations.

pub mod admin;
pub mod shop;
