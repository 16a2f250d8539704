//! Type-safe unit price using decimal arithmetic.
//!
//! The persisted cart stores prices as plain JSON numbers (`"price": 10`), so
//! [`Price`] serializes through `rust_decimal::serde::float` instead of the
//! string encoding used elsewhere in `rust_decimal`.
//!
//! A JSON number is read back as an `f64`, so a price is limited to amounts an
//! `f64` carries exactly: at most [`Price::MAX_SIGNIFICANT_DIGITS`] significant
//! digits, of which at most [`Price::MAX_SCALE`] follow the decimal point.
//! Every constructor enforces this, which keeps the saved cart equal to the
//! one in memory after a reload.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Errors that can occur when creating a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a decimal number: {0}")]
    Invalid(String),
    /// The input is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The input has more decimal places than a stored price keeps.
    #[error("price cannot have more than {max} decimal places")]
    TooManyDecimalPlaces {
        /// Largest accepted number of decimal places.
        max: u32,
    },
    /// The input has more significant digits than a stored price keeps.
    #[error("price cannot have more than {max} significant digits")]
    TooManyDigits {
        /// Largest accepted number of significant digits.
        max: u32,
    },
}

/// A unit price in the store's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Most digits after the decimal point.
    pub const MAX_SCALE: u32 = 6;

    /// Most significant digits, counting both sides of the decimal point.
    pub const MAX_SIGNIFICANT_DIGITS: u32 = 15;

    /// Create a price from a decimal amount.
    ///
    /// Trailing zeros are dropped, so `10.50` and `10.5` are the same price.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or needs more digits than
    /// [`Price::MAX_SCALE`] / [`Price::MAX_SIGNIFICANT_DIGITS`] allow.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        let amount = amount.normalize();
        if amount.scale() > Self::MAX_SCALE {
            return Err(PriceError::TooManyDecimalPlaces {
                max: Self::MAX_SCALE,
            });
        }
        if amount.mantissa().unsigned_abs() >= 10_u128.pow(Self::MAX_SIGNIFICANT_DIGITS) {
            return Err(PriceError::TooManyDigits {
                max: Self::MAX_SIGNIFICANT_DIGITS,
            });
        }

        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2).normalize())
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Parse a user-supplied amount such as `"19.99"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal number, is negative, or
    /// is too precise to store.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(s.trim()).map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(de::Error::custom)
    }
}
