//! Type-safe price and quantity representation using decimal arithmetic.
//!
//! Menu prices are dollar amounts stored in a `NUMERIC` column. All
//! arithmetic stays in [`Decimal`] so order totals never pick up binary
//! floating-point error.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("invalid price: {0:?}")]
    Invalid(String),
    /// The amount is below zero.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
    /// The amount does not fit the stored `NUMERIC(10,2)` column.
    #[error("price cannot exceed {max}: {0}", max = Price::MAX)]
    TooLarge(Decimal),
    /// The amount has fractions of a cent.
    #[error("price has more than two decimal places: {0}")]
    SubCent(Decimal),
}

/// A non-negative menu price in dollars, in whole cents, no larger than
/// [`Price::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The largest amount a `NUMERIC(10,2)` column holds: 99,999,999.99.
    pub const MAX: Self = Self(Decimal::from_parts(1_410_065_407, 2, 0, false, 2));

    /// Create a price from a decimal amount.
    ///
    /// Trailing zeros are ignored, so `1.500` is accepted as `1.50`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero,
    /// `PriceError::TooLarge` above [`Price::MAX`], and
    /// `PriceError::SubCent` for fractions of a cent.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::SubCent(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `cents` is below zero and
    /// `PriceError::TooLarge` above [`Price::MAX`].
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Parse terminal input such as `3.50`, `$3.50` or ` 2 `.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Invalid` for non-numeric input, otherwise any
    /// error of [`Price::new`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let amount: Decimal = digits
            .parse()
            .map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }

    /// The dollar amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, or `None` if the product overflows.
    #[must_use]
    pub fn times(&self, quantity: Quantity) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity.get()))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The input is not an integer.
    #[error("invalid quantity: {0:?}")]
    Invalid(String),
    /// The quantity is zero or negative.
    #[error("quantity must be at least 1 (got {0})")]
    TooSmall(i32),
}

/// Number of units of one item on an order line. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooSmall` if `n < 1`.
    pub const fn new(n: i32) -> Result<Self, QuantityError> {
        if n < 1 {
            return Err(QuantityError::TooSmall(n));
        }
        Ok(Self(n))
    }

    /// Parse terminal input.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::Invalid` for non-integers and
    /// `QuantityError::TooSmall` for values below 1.
    pub fn parse(s: &str) -> Result<Self, QuantityError> {
        let n: i32 = s
            .trim()
            .parse()
            .map_err(|_| QuantityError::Invalid(s.to_owned()))?;
        Self::new(n)
    }

    /// The unit count.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(n: i32) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}
