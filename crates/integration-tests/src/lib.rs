//! Shared helpers for the integration test suites.
//!
//! Suites run the real RPC handlers over the in-memory backend; no
//! network listener or database is involved.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use tonic::Request;
use tonic::metadata::MetadataValue;

use tiendita_grpc::{ShopAdminApi, ShopApi};
use tiendita_store::testing::MemoryBackend;

/// Build a request carrying `token` as the bearer credential.
pub fn request_as<T>(token: &str, inner: T) -> Request<T> {
    let mut request = Request::new(inner);
    request.metadata_mut().insert(
        "authorization",
        MetadataValue::try_from(format!("Bearer {token}")).expect("ascii token"),
    );
    request
}

/// A backend with both services wired over it.
pub struct Harness {
    pub backend: Arc<MemoryBackend>,
    pub shop: ShopApi,
    pub admin: ShopAdminApi,
}

impl Harness {
    /// Fresh backend with one admin (`root`) and one shopper (`shopper`).
    #[must_use]
    pub fn new() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        backend.register_user("root", "root@tiendita.test", true);
        backend.register_user("shopper", "ana@tiendita.test", false);
        let shop = ShopApi::new(backend.clone());
        let admin = ShopAdminApi::new(backend.clone());
        Self {
            backend,
            shop,
            admin,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
