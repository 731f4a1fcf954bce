//! Authenticated users.

use serde::{Deserialize, Serialize};

use tiendita_core::UserId;

/// A user resolved from a bearer token.
///
/// Stands in for the managed backend's built-in auth: the token itself is
/// opaque to this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub is_admin: bool,
}
