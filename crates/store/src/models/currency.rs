//! Currencies and exchange rates.

use serde::{Deserialize, Serialize};

/// A supported currency with its rate relative to the base currency.
///
/// Exactly one currency should carry `is_base = true`; the store does not
/// validate this, seed data owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Currency {
    /// ISO 4217 code, e.g. "EUR".
    pub code: String,
    pub name: String,
    pub symbol: String,
    /// Units of this currency per one unit of the base currency.
    pub rate: f64,
    pub is_base: bool,
}
