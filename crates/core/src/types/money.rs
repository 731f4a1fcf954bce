//! Price representation in integer minor currency units.
//!
//! All catalog prices, cart line totals, and order amounts are stored as
//! whole minor units (cents for EUR/USD). Arithmetic stays in integers;
//! fractional values only appear transiently during currency conversion.

use serde::{Deserialize, Serialize};

/// A monetary amount in minor currency units (e.g. cents).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Create a price from minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Get the amount in minor units.
    #[must_use]
    pub const fn as_minor(&self) -> i64 {
        self.0
    }

    /// Line total for a quantity of this unit price.
    ///
    /// Saturates on overflow; catalog prices and quantities are nowhere
    /// near `i64::MAX`.
    #[must_use]
    pub const fn times(&self, quantity: i32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// Sum of two amounts, saturating on overflow.
    #[must_use]
    pub const fn plus(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl std::fmt::Display for Price {
    /// Formats as a decimal amount, e.g. `1234` -> `12.34`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Price {
    fn from(minor: i64) -> Self {
        Self(minor)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let minor = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(minor))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(Price::from_minor(1234).to_string(), "12.34");
        assert_eq!(Price::from_minor(5).to_string(), "0.05");
        assert_eq!(Price::from_minor(-150).to_string(), "-1.50");
    }

    #[test]
    fn test_times_and_plus() {
        let unit = Price::from_minor(250);
        assert_eq!(unit.times(3), Price::from_minor(750));
        assert_eq!(unit.plus(Price::from_minor(50)), Price::from_minor(300));
    }
}
