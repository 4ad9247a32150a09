//! # Domain Enums
//!
//! Roles, listing lifecycles and listing attributes.
//!
//! - [`Role`] - Vendor or supplier
//! - [`RequestStatus`] - Individual request lifecycle
//! - [`GroupStatus`] - Buying group lifecycle
//! - [`GroupRequestStatus`] - Pooled request lifecycle
//! - [`Urgency`], [`DeliveryPreference`] - Request attributes
//!
//! All enums serialize in `snake_case`, implement `Display` with the same
//! spelling, and parse case-insensitively through `FromStr`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! str_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the canonical lowercase spelling.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError::InvalidValue($label, s.to_string())),
                }
            }
        }
    };
}

/// Marketplace role of an authenticated user.
///
/// # Examples
///
/// ```
/// use procurement_engine::domain::value_objects::enums::Role;
///
/// let role: Role = "Vendor".parse().unwrap();
/// assert_eq!(role, Role::Vendor);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Posts requests, forms groups, accepts offers.
    Vendor,
    /// Bids on requests and group requests.
    Supplier,
}

str_enum!(Role, "Role", { Vendor => "vendor", Supplier => "supplier" });

/// Lifecycle of an individual request.
///
/// ```text
/// Open → Fulfilled
///   ↓
///   └→ Expired / Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Accepting offers.
    #[default]
    Open,
    /// An offer was accepted (terminal).
    Fulfilled,
    /// Expired by time or closed early by the owner (terminal).
    Expired,
    /// Withdrawn (terminal).
    Cancelled,
}

str_enum!(RequestStatus, "RequestStatus", {
    Open => "open",
    Fulfilled => "fulfilled",
    Expired => "expired",
    Cancelled => "cancelled",
});

impl RequestStatus {
    /// Returns true if no further transitions are possible.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// Lifecycle of a buying group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Accepting members.
    #[default]
    Forming,
    /// A group request is open to suppliers.
    Active,
    /// The leader is negotiating with suppliers.
    Negotiating,
    /// An offer was accepted (terminal).
    DealClosed,
    /// Abandoned (terminal).
    Cancelled,
}

str_enum!(GroupStatus, "GroupStatus", {
    Forming => "forming",
    Active => "active",
    Negotiating => "negotiating",
    DealClosed => "deal_closed",
    Cancelled => "cancelled",
});

/// Lifecycle of a pooled group request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRequestStatus {
    /// Accepting offers.
    #[default]
    Active,
    /// An offer was accepted (terminal).
    Completed,
    /// Timed out (terminal).
    Expired,
    /// Withdrawn (terminal).
    Cancelled,
}

str_enum!(GroupRequestStatus, "GroupRequestStatus", {
    Active => "active",
    Completed => "completed",
    Expired => "expired",
    Cancelled => "cancelled",
});

impl GroupRequestStatus {
    /// Returns true if no further transitions are possible.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// How soon the vendor needs the goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// No rush.
    Low,
    /// Default urgency.
    #[default]
    Medium,
    /// Needed soon.
    High,
}

str_enum!(Urgency, "Urgency", { Low => "low", Medium => "medium", High => "high" });

/// How the vendor wants to receive the goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPreference {
    /// Vendor collects.
    Pickup,
    /// Supplier delivers.
    Delivery,
    /// Either works.
    #[default]
    Both,
}

str_enum!(DeliveryPreference, "DeliveryPreference", {
    Pickup => "pickup",
    Delivery => "delivery",
    Both => "both",
});

/// Error returned when parsing an enum from an unknown string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEnumError {
    /// The provided string value is not valid for the enum.
    InvalidValue(&'static str, String),
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue(enum_name, value) => {
                write!(f, "invalid {enum_name} value: '{value}'")
            }
        }
    }
}

impl std::error::Error for ParseEnumError {}
