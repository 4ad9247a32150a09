//! # Timestamp Value Object
//!
//! UTC instant used for listing expiry, membership and negotiation history.
//!
//! Expiry checks always take an explicit `now` so that callers driven by a
//! clock (the expiration sweep, tests) stay deterministic.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::value_objects::timestamp::Timestamp;
//!
//! let created = Timestamp::from_secs(1_700_000_000).unwrap();
//! let expires = created.add_days(7);
//!
//! assert!(!expires.has_passed(created));
//! assert!(expires.has_passed(expires));
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// Returns `None` if the value is out of range.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Creates a timestamp from Unix milliseconds.
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    /// Returns the Unix timestamp in seconds.
    #[inline]
    #[must_use]
    pub fn timestamp_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Returns the Unix timestamp in milliseconds.
    #[inline]
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Adds seconds (negative values move backwards).
    ///
    /// Saturates at the representable range instead of overflowing.
    #[must_use]
    pub fn add_secs(&self, secs: i64) -> Self {
        let shifted = Duration::try_seconds(secs).and_then(|d| self.0.checked_add_signed(d));
        match shifted {
            Some(at) => Self(at),
            None if secs < 0 => Self(DateTime::<Utc>::MIN_UTC),
            None => Self(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Subtracts seconds.
    #[must_use]
    pub fn sub_secs(&self, secs: i64) -> Self {
        self.add_secs(secs.saturating_neg())
    }

    /// Adds whole days, saturating like [`add_secs`](Self::add_secs).
    #[must_use]
    pub fn add_days(&self, days: i64) -> Self {
        self.add_secs(days.saturating_mul(86_400))
    }

    /// Returns true once `now` has reached this instant.
    ///
    /// An instant exactly equal to `now` counts as passed, so a listing with
    /// `expires_at <= now` is expired.
    #[inline]
    #[must_use]
    pub fn has_passed(&self, now: Timestamp) -> bool {
        self.0 <= now.0
    }

    /// Returns true if this timestamp is strictly before another.
    #[inline]
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    /// Returns true if this timestamp is strictly after another.
    #[inline]
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self.0 > other.0
    }

    /// Returns the time left until this instant, or zero if it has passed.
    #[must_use]
    pub fn remaining_from(&self, now: Timestamp) -> std::time::Duration {
        (self.0 - now.0)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }

    /// Returns the underlying DateTime.
    #[inline]
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Timestamp {
        Timestamp::from_secs(1_704_067_200).unwrap()
    }

    #[test]
    fn add_days_moves_forward() {
        let ts = base().add_days(3);
        assert_eq!(ts.timestamp_secs(), 1_704_067_200 + 3 * 86_400);
    }

    #[test]
    fn huge_offsets_saturate() {
        assert_eq!(
            base().add_days(i64::MAX).as_datetime(),
            &DateTime::<Utc>::MAX_UTC
        );
        assert_eq!(
            base().sub_secs(i64::MAX).as_datetime(),
            &DateTime::<Utc>::MIN_UTC
        );
        assert!(base().add_days(3_650_000_000).is_after(&base()));
    }

    #[test]
    fn has_passed_is_inclusive() {
        let ts = base();
        assert!(ts.has_passed(ts));
        assert!(ts.has_passed(ts.add_secs(1)));
        assert!(!ts.has_passed(ts.sub_secs(1)));
    }

    #[test]
    fn remaining_is_zero_once_passed() {
        let ts = base();
        assert_eq!(ts.remaining_from(ts.add_secs(10)), std::time::Duration::ZERO);
        assert_eq!(
            ts.add_secs(90).remaining_from(ts),
            std::time::Duration::from_secs(90)
        );
    }

    #[test]
    fn ordering_helpers() {
        let earlier = base();
        let later = earlier.add_secs(1);
        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
    }

    #[test]
    fn serde_roundtrip() {
        let ts = base();
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
