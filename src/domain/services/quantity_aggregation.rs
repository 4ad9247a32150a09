//! # Quantity Aggregation
//!
//! Sums member quantities of a buying group into one pooled quantity.
//!
//! The unit of the first entry is the reference unit. Entries in the same
//! unit (compared case-insensitively) are summed; entries in any other unit
//! are left out of the total. The result keeps the reference unit's original
//! spelling and a normalized magnitude (`20 + 30` yields `50kg`, never
//! `50.0kg`).
//!
//! Aggregation is pure. Callers recompute from the full member list on every
//! membership change.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::services::quantity_aggregation::QuantityAggregator;
//!
//! let total = QuantityAggregator::aggregate_strings(&["20kg", "30kg", "5lb"], "0kg");
//! assert_eq!(total, "50kg");
//! ```

use crate::domain::value_objects::Quantity;
use rust_decimal::Decimal;

/// Stateless aggregator for member quantities.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantityAggregator;

impl QuantityAggregator {
    /// Sums quantities sharing the first entry's unit.
    ///
    /// Returns `None` when there is nothing to sum or the sum is zero.
    #[must_use]
    pub fn aggregate<'a, I>(quantities: I) -> Option<Quantity>
    where
        I: IntoIterator<Item = &'a Quantity>,
    {
        let mut iter = quantities.into_iter();
        let reference = iter.next()?;
        let mut total = reference.magnitude();

        for quantity in iter {
            if !quantity.same_unit(reference) {
                tracing::debug!(
                    reference = %reference.unit(),
                    skipped = %quantity,
                    "quantity in a different unit left out of total"
                );
                continue;
            }
            total = total.checked_add(quantity.magnitude())?;
        }

        if total <= Decimal::ZERO {
            return None;
        }
        Quantity::from_parts(total, reference.unit()).ok()
    }

    /// Like [`aggregate`](Self::aggregate), falling back to `fallback`.
    #[must_use]
    pub fn aggregate_or<'a, I>(quantities: I, fallback: &Quantity) -> Quantity
    where
        I: IntoIterator<Item = &'a Quantity>,
    {
        Self::aggregate(quantities).unwrap_or_else(|| fallback.clone())
    }

    /// Aggregates raw strings, skipping any that do not parse.
    ///
    /// Returns `fallback` unchanged when nothing parses or the sum is zero.
    #[must_use]
    pub fn aggregate_strings(quantities: &[&str], fallback: &str) -> String {
        let parsed: Vec<Quantity> = quantities
            .iter()
            .filter_map(|q| Quantity::parse(q).ok())
            .collect();
        Self::aggregate(&parsed).map_or_else(|| fallback.to_string(), |q| q.to_string())
    }

    /// Returns the number a per-unit price is multiplied by for a pooled
    /// quantity: its magnitude.
    #[inline]
    #[must_use]
    pub fn quantity_factor(quantity: &Quantity) -> Decimal {
        quantity.magnitude()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn q(s: &str) -> Quantity {
        Quantity::parse(s).unwrap()
    }

    #[test]
    fn mixed_units_drop_the_odd_one_out() {
        let total = QuantityAggregator::aggregate(&[q("20kg"), q("30kg"), q("5lb")]).unwrap();
        assert_eq!(total.as_str(), "50kg");
    }

    #[test]
    fn unit_comparison_ignores_case() {
        let total = QuantityAggregator::aggregate(&[q("1.5KG"), q("2kg")]).unwrap();
        assert_eq!(total.as_str(), "3.5KG");
    }

    #[test]
    fn first_entry_sets_reference_unit() {
        let total = QuantityAggregator::aggregate(&[q("5lb"), q("20kg"), q("1lb")]).unwrap();
        assert_eq!(total.as_str(), "6lb");
    }

    #[test]
    fn empty_input_uses_fallback() {
        let fallback = q("10 units");
        let total = QuantityAggregator::aggregate_or(std::iter::empty(), &fallback);
        assert_eq!(total, fallback);
    }

    #[test]
    fn zero_sum_uses_fallback() {
        assert_eq!(
            QuantityAggregator::aggregate_strings(&["0kg", "0kg"], "7kg"),
            "7kg"
        );
    }

    #[test]
    fn unparseable_strings_are_skipped() {
        assert_eq!(
            QuantityAggregator::aggregate_strings(&["lots", "4 boxes", "6boxes"], "x"),
            "10boxes"
        );
        assert_eq!(QuantityAggregator::aggregate_strings(&["lots"], "x"), "x");
    }

    #[test]
    fn quantity_factor_is_magnitude() {
        assert_eq!(
            QuantityAggregator::quantity_factor(&q("50kg")),
            Decimal::from(50)
        );
    }

    proptest! {
        #[test]
        fn same_unit_sum_matches_integer_sum(values in proptest::collection::vec(1u32..10_000, 1..20)) {
            let quantities: Vec<Quantity> = values.iter().map(|v| q(&format!("{v}kg"))).collect();
            let total = QuantityAggregator::aggregate(&quantities).unwrap();
            let expected: u64 = values.iter().map(|v| u64::from(*v)).sum();
            prop_assert_eq!(total.as_str(), format!("{expected}kg"));
        }

        #[test]
        fn aggregation_is_idempotent(values in proptest::collection::vec(1u32..1_000, 1..10)) {
            let quantities: Vec<Quantity> = values.iter().map(|v| q(&format!("{v}kg"))).collect();
            let first = QuantityAggregator::aggregate(&quantities);
            let second = QuantityAggregator::aggregate(&quantities);
            prop_assert_eq!(first, second);
        }
    }
}
