//! # Quantity Value Object
//!
//! Free-form quantity strings such as `"50kg"` or `"500 units"`, parsed into
//! a decimal magnitude and a unit.
//!
//! Only strings matching `^\d+(\.\d+)?\s*[a-zA-Z]+$` (after trimming) are
//! accepted. The original spelling is preserved for display.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::value_objects::Quantity;
//! use rust_decimal::Decimal;
//!
//! let qty = Quantity::parse("50kg").unwrap();
//! assert_eq!(qty.magnitude(), Decimal::from(50));
//! assert_eq!(qty.unit(), "kg");
//!
//! assert!(Quantity::parse("kg50").is_err());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static QUANTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(\d+(?:\.\d+)?)\s*([a-zA-Z]+)$").expect("quantity pattern is valid")
});

/// A validated quantity with magnitude and unit.
///
/// # Invariants
///
/// - `raw` matches the quantity pattern
/// - `magnitude` and `unit` are exactly what `raw` encodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quantity {
    raw: String,
    magnitude: Decimal,
    unit: String,
}

impl Quantity {
    /// Parses a quantity string.
    ///
    /// Surrounding whitespace is ignored; whitespace between number and
    /// unit is kept in the display form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuantity` if the string does not match
    /// `<number><unit>`.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let raw = input.trim();
        let captures = QUANTITY_PATTERN.captures(raw).ok_or_else(|| {
            DomainError::InvalidQuantity(format!(
                "'{raw}' should look like \"100kg\" or \"500 units\""
            ))
        })?;

        let magnitude = Decimal::from_str(&captures[1])
            .map_err(|e| DomainError::InvalidQuantity(format!("'{raw}': {e}")))?;

        Ok(Self {
            raw: raw.to_string(),
            magnitude,
            unit: captures[2].to_string(),
        })
    }

    /// Builds a quantity from an already-known magnitude and unit.
    ///
    /// The display form is the normalized magnitude immediately followed by
    /// the unit, e.g. `50kg`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuantity` if the magnitude is negative or
    /// the unit is not purely alphabetic.
    pub fn from_parts(magnitude: Decimal, unit: &str) -> DomainResult<Self> {
        if magnitude.is_sign_negative() {
            return Err(DomainError::InvalidQuantity(format!(
                "magnitude must not be negative, got {magnitude}"
            )));
        }
        Self::parse(&format!("{}{unit}", magnitude.normalize()))
    }

    /// Returns the quantity as originally written (trimmed).
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the numeric magnitude.
    #[inline]
    #[must_use]
    pub fn magnitude(&self) -> Decimal {
        self.magnitude
    }

    /// Returns the unit as written.
    #[inline]
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Returns true if both quantities use the same unit, ignoring case.
    #[must_use]
    pub fn same_unit(&self, other: &Self) -> bool {
        self.unit.eq_ignore_ascii_case(&other.unit)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for Quantity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Quantity {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Quantity> for String {
    fn from(quantity: Quantity) -> Self {
        quantity.raw
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_number_and_unit() {
        let qty = Quantity::parse("20kg").unwrap();
        assert_eq!(qty.magnitude(), Decimal::from(20));
        assert_eq!(qty.unit(), "kg");
        assert_eq!(qty.as_str(), "20kg");
    }

    #[test]
    fn allows_space_and_decimals() {
        let qty = Quantity::parse("  12.5 Units ").unwrap();
        assert_eq!(qty.magnitude(), Decimal::from_str("12.5").unwrap());
        assert_eq!(qty.unit(), "Units");
        assert_eq!(qty.as_str(), "12.5 Units");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "kg", "10", "-5kg", "5 kg extra", "1.kg", "ten kg", "5kg2"] {
            assert!(Quantity::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn same_unit_ignores_case() {
        let a = Quantity::parse("1KG").unwrap();
        let b = Quantity::parse("2kg").unwrap();
        let c = Quantity::parse("2lb").unwrap();
        assert!(a.same_unit(&b));
        assert!(!a.same_unit(&c));
    }

    #[test]
    fn from_parts_normalizes() {
        let qty = Quantity::from_parts(Decimal::from_str("50.0").unwrap(), "kg").unwrap();
        assert_eq!(qty.as_str(), "50kg");
    }

    #[test]
    fn serde_uses_display_form() {
        let qty = Quantity::parse("30 kg").unwrap();
        assert_eq!(serde_json::to_string(&qty).unwrap(), "\"30 kg\"");
        assert!(serde_json::from_str::<Quantity>("\"lots\"").is_err());
    }

    proptest! {
        #[test]
        fn parse_roundtrips_magnitude(
            whole in 0u32..1_000_000,
            frac in proptest::option::of(0u32..1000),
            space in proptest::bool::ANY,
            unit in "[a-zA-Z]{1,6}",
        ) {
            let number = match frac {
                Some(f) => format!("{whole}.{f}"),
                None => whole.to_string(),
            };
            let text = format!("{number}{}{unit}", if space { " " } else { "" });
            let qty = Quantity::parse(&text).unwrap();
            prop_assert_eq!(qty.magnitude(), Decimal::from_str(&number).unwrap());
            prop_assert_eq!(qty.unit(), unit.as_str());
            prop_assert_eq!(qty.to_string(), text);
        }
    }
}
