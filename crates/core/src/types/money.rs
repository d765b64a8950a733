//! Fixed-point money amounts.
//!
//! The store sells in a single currency, so `Money` is a thin wrapper around
//! [`Decimal`] that always carries two decimal places. Amounts serialize as
//! strings (`"250.00"`) to avoid float rounding in clients.
//!
//! Amounts are capped at [`Money::MAX`], the largest value a `NUMERIC(10,2)`
//! column holds. Arithmetic that would pass the cap fails instead.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Quantity;

/// Number of decimal places stored for every amount.
pub const MONEY_SCALE: u32 = 2;

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Catalog and order amounts are never negative.
    #[error("amount cannot be negative")]
    Negative,
    /// Larger than [`Money::MAX`].
    #[error("amount cannot exceed {}", Money::MAX)]
    TooLarge,
}

/// A non-negative amount in the store currency, rounded to two places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// 99,999,999.99, the largest stored amount.
    pub const MAX: Self = Self(Decimal::from_parts(1_410_065_407, 2, 0, false, MONEY_SCALE));

    /// Create an amount, rounding half-even to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for amounts below zero and
    /// [`MoneyError::TooLarge`] for amounts that round above [`Money::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        let mut amount = amount.round_dp(MONEY_SCALE);
        amount.rescale(MONEY_SCALE);
        if amount > Self::MAX.0 {
            return Err(MoneyError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::TooLarge`] if the product passes [`Money::MAX`].
    pub fn times(self, quantity: Quantity) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(Decimal::from(quantity.get()))
            .ok_or(MoneyError::TooLarge)
            .and_then(Self::new)
    }

    /// Sum of two amounts.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::TooLarge`] if the sum passes [`Money::MAX`].
    pub fn checked_add(self, rhs: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_add(rhs.0)
            .ok_or(MoneyError::TooLarge)
            .and_then(Self::new)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

/// Order total: the sum of `unit_price × quantity` over every line.
///
/// This is the only way an order's `total_amount` is derived.
///
/// ```
/// use rust_decimal::Decimal;
/// use shopvely_core::{Money, Quantity, order_total};
///
/// let a = Money::new(Decimal::new(100_00, 2)).unwrap();
/// let b = Money::new(Decimal::new(50_00, 2)).unwrap();
/// let lines = [(a, Quantity::new(2).unwrap()), (b, Quantity::new(1).unwrap())];
///
/// assert_eq!(order_total(lines).unwrap().amount(), Decimal::new(250_00, 2));
/// ```
///
/// # Errors
///
/// Returns [`MoneyError::TooLarge`] if a line or the total passes [`Money::MAX`].
pub fn order_total<I>(lines: I) -> Result<Money, MoneyError>
where
    I: IntoIterator<Item = (Money, Quantity)>,
{
    lines
        .into_iter()
        .try_fold(Money::ZERO, |total, (price, quantity)| {
            total.checked_add(price.times(quantity)?)
        })
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(cents: i64) -> Money {
        Money::new(Decimal::new(cents, 2)).unwrap()
    }

    fn qty(n: i32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Money::new(Decimal::new(-1, 2)), Err(MoneyError::Negative));
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_new_rounds_to_two_places() {
        let m = Money::new(Decimal::new(199_995, 3)).unwrap();
        assert_eq!(m.amount().to_string(), "200.00");

        let whole = Money::new(Decimal::from(100)).unwrap();
        assert_eq!(whole.amount().to_string(), "100.00");
    }

    #[test]
    fn test_new_rejects_amounts_above_max() {
        assert_eq!(Money::MAX.amount().to_string(), "99999999.99");
        assert_eq!(Money::new(Money::MAX.amount()), Ok(Money::MAX));
        assert_eq!(
            Money::new(Decimal::new(100_000_000_00, 2)),
            Err(MoneyError::TooLarge)
        );
        // Rounds up past the cap
        assert_eq!(
            Money::new(Decimal::new(99_999_999_995, 3)),
            Err(MoneyError::TooLarge)
        );
    }

    #[test]
    fn test_order_total_matches_sum_of_lines() {
        let lines = vec![(money(100_00), qty(2)), (money(50_00), qty(1))];
        assert_eq!(order_total(lines), Ok(money(250_00)));
    }

    #[test]
    fn test_order_total_of_no_lines_is_zero() {
        assert_eq!(order_total(Vec::new()), Ok(Money::ZERO));
    }

    #[test]
    fn test_order_total_rejects_overflowing_line() {
        let lines = vec![(money(100_00), qty(1_000_000))];
        assert_eq!(order_total(lines), Err(MoneyError::TooLarge));

        assert_eq!(money(1).times(qty(i32::MAX)).unwrap().amount().to_string(), "21474836.47");
        assert_eq!(Money::MAX.times(qty(2)), Err(MoneyError::TooLarge));
    }

    #[test]
    fn test_order_total_rejects_overflowing_sum() {
        let half = money(50_000_000_00);
        assert_eq!(order_total(vec![(half, qty(1)), (half, qty(1))]), Err(MoneyError::TooLarge));
        assert_eq!(
            order_total(vec![(half, qty(1)), (money(49_999_999_99), qty(1))]),
            Ok(Money::MAX)
        );
    }

    #[test]
    fn test_serializes_as_string() {
        assert_eq!(serde_json::to_string(&money(1_999)).unwrap(), "\"19.99\"");
        let parsed: Money = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(parsed, money(1_999));
        assert!(serde_json::from_str::<Money>("\"-3.00\"").is_err());
        assert!(serde_json::from_str::<Money>("\"100000000.00\"").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(money(250_00).to_string(), "₹250.00");
    }
}
