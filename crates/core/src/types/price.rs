//! Unit price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
    /// The input could not be read as a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// The amount would change when stored as a JSON number.
    #[error("price {0} cannot be stored exactly")]
    Unrepresentable(Decimal),
}

/// Unit price of a cart line, in the catalog's currency.
///
/// The cart does not do pricing or currency conversion, so a price is just a
/// non-negative decimal amount carried through from the catalog. It is
/// serialized as a plain JSON number to stay compatible with carts that were
/// persisted by earlier app builds.
///
/// A JSON number is read back as an `f64`, so only amounts that survive that
/// conversion unchanged are accepted. In practice this means at most 15
/// significant digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Price(Decimal);

impl Price {
    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero, or
    /// `PriceError::Unrepresentable` if it would not read back unchanged
    /// from storage.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if to_wire(amount).and_then(from_wire) != Some(amount) {
            return Err(PriceError::Unrepresentable(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in the smallest currency unit (e.g. cents).
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is below zero or too large to store.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Parse a price from a decimal string such as `"19.99"`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Invalid` if the string is not a decimal number,
    /// otherwise the errors of [`Price::new`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| PriceError::Invalid(format!("{s:?}: {e}")))?;
        Self::new(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The JSON number written for `amount`, correctly rounded.
fn to_wire(amount: Decimal) -> Option<f64> {
    amount.to_string().parse().ok()
}

/// The amount a stored JSON number reads back as.
fn from_wire(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    value.to_string().parse().ok()
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = to_wire(self.0).ok_or_else(|| {
            serde::ser::Error::custom(format!("price {} cannot be stored", self.0))
        })?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        let amount = from_wire(value).ok_or_else(|| {
            serde::de::Error::custom(format!("price {value} is out of range"))
        })?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}
