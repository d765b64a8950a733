//! Line quantities for carts and orders.

use serde::{Deserialize, Serialize};

/// Errors produced by quantity rules.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative quantity where a positive one is required.
    #[error("quantity must be positive")]
    NotPositive,
    /// Incrementing a line would overflow the storage type.
    #[error("quantity is too large")]
    Overflow,
}

/// A strictly positive number of units.
///
/// Cart and order lines never hold a zero or negative quantity; a request to
/// drop a line to zero is expressed as [`QuantityUpdate::Remove`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// One unit, the default for add-to-cart.
    pub const ONE: Self = Self(1);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] when `n <= 0`.
    pub const fn new(n: i32) -> Result<Self, QuantityError> {
        if n <= 0 {
            return Err(QuantityError::NotPositive);
        }
        Ok(Self(n))
    }

    /// The raw count.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Add `more` units to an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Overflow`] if the sum does not fit.
    pub const fn increment(self, more: Self) -> Result<Self, QuantityError> {
        match self.0.checked_add(more.0) {
            Some(n) => Ok(Self(n)),
            None => Err(QuantityError::Overflow),
        }
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(n: i32) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

/// Outcome of a set-quantity request on an existing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// The requested quantity was zero or negative: delete the line.
    Remove,
    /// Overwrite the line's quantity.
    Set(Quantity),
}

impl QuantityUpdate {
    /// Interpret a requested quantity: `<= 0` removes the line.
    #[must_use]
    pub const fn from_requested(n: i32) -> Self {
        match Quantity::new(n) {
            Ok(q) => Self::Set(q),
            Err(_) => Self::Remove,
        }
    }
}
