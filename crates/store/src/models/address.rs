//! Postal addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tiendita_core::{AddressId, AddressKind, UserId};

/// A stored postal address.
///
/// At most one address per (user, kind) carries `is_default = true`;
/// the writer enforces this, not the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub kind: AddressKind,
    /// Recipient or label, e.g. "Home".
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAddress {
    pub user_id: UserId,
    pub kind: AddressKind,
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}
