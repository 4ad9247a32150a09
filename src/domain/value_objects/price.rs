//! # Price Value Object
//!
//! Strictly positive decimal price.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::value_objects::Price;
//! use rust_decimal::Decimal;
//!
//! let price = Price::new(12).unwrap();
//! assert_eq!(price.value(), Decimal::from(12));
//! assert!(Price::new(0).is_err());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A positive per-unit price.
///
/// # Invariants
///
/// - Always strictly greater than zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Creates a price, rejecting zero and negative values.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPrice` if the value is not positive.
    pub fn new(value: impl Into<Decimal>) -> DomainResult<Self> {
        let value = value.into();
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice(format!(
                "price must be positive, got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Creates a price from a float, as received from loosely typed callers.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPrice` if the value is not finite or not positive.
    pub fn from_f64(value: f64) -> DomainResult<Self> {
        let decimal = Decimal::try_from(value)
            .map_err(|_| DomainError::InvalidPrice(format!("price {value} is not a number")))?;
        Self::new(decimal)
    }

    /// Returns the decimal value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Multiplies the unit price by a quantity factor.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ArithmeticOverflow` if the product does not fit.
    pub fn total_for(&self, factor: Decimal) -> DomainResult<Decimal> {
        self.0
            .checked_mul(factor)
            .ok_or_else(|| DomainError::ArithmeticOverflow(format!("{} x {factor}", self.0)))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive() {
        assert!(Price::new(0).is_err());
        assert!(Price::new(-5).is_err());
        assert!(Price::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn accepts_fractional_values() {
        let price = Price::from_f64(10.5).unwrap();
        assert_eq!(price.to_string(), "10.5");
    }

    #[test]
    fn total_for_multiplies() {
        let price = Price::new(12).unwrap();
        assert_eq!(price.total_for(Decimal::from(50)).unwrap(), Decimal::from(600));
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<Price>("\"0\"").is_err());
        let price: Price = serde_json::from_str("\"11\"").unwrap();
        assert_eq!(price, Price::new(11).unwrap());
    }
}
