//! # Offer Status
//!
//! Negotiation lifecycle shared by offers and group offers.
//!
//! # State Machine
//!
//! ```text
//! Pending ──counter──→ Countered ──respond──→ Pending (offer)
//!    │                  │  ↑ └─────respond──→ UnderNegotiation (group offer)
//!    │                  └──┘ counter             │
//!    │                                           └──counter──→ Countered
//!    ├──────────────────┴──────────────────────┴→ Accepted
//!    └──────────────────┴──────────────────────┴→ Rejected
//! ```
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::value_objects::offer_status::OfferStatus;
//!
//! assert!(OfferStatus::Pending.can_transition_to(OfferStatus::Countered));
//! assert!(!OfferStatus::Accepted.can_transition_to(OfferStatus::Rejected));
//! ```

use crate::domain::value_objects::enums::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of an offer or group offer.
///
/// # Terminal States
///
/// - [`Accepted`](OfferStatus::Accepted) - the listing owner took the offer
/// - [`Rejected`](OfferStatus::Rejected) - declined, outbid, or the listing expired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Awaiting the listing owner.
    #[default]
    Pending,
    /// The owner countered; awaiting the supplier.
    Countered,
    /// The supplier answered a counter on a group offer; awaiting the leader.
    UnderNegotiation,
    /// Taken by the listing owner (terminal).
    Accepted,
    /// Closed without a deal (terminal).
    Rejected,
}

impl OfferStatus {
    /// Returns true if this is a terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Returns true while the offer is still in play.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the offer is waiting on its supplier.
    #[inline]
    #[must_use]
    pub const fn awaits_supplier(&self) -> bool {
        matches!(self, Self::Countered)
    }

    /// Returns true if this state can transition to the target state.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            // From Pending
            (Self::Pending, Self::Countered)
                | (Self::Pending, Self::Accepted)
                | (Self::Pending, Self::Rejected)
                // From Countered
                | (Self::Countered, Self::Countered)
                | (Self::Countered, Self::Pending)
                | (Self::Countered, Self::UnderNegotiation)
                | (Self::Countered, Self::Accepted)
                | (Self::Countered, Self::Rejected)
                // From UnderNegotiation
                | (Self::UnderNegotiation, Self::Countered)
                | (Self::UnderNegotiation, Self::Accepted)
                | (Self::UnderNegotiation, Self::Rejected)
        )
    }

    /// Returns the valid next states from this state.
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Pending => vec![Self::Countered, Self::Accepted, Self::Rejected],
            Self::Countered => vec![
                Self::Countered,
                Self::Pending,
                Self::UnderNegotiation,
                Self::Accepted,
                Self::Rejected,
            ],
            Self::UnderNegotiation => vec![Self::Countered, Self::Accepted, Self::Rejected],
            Self::Accepted | Self::Rejected => vec![],
        }
    }

    /// Returns the canonical lowercase spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Countered => "countered",
            Self::UnderNegotiation => "under_negotiation",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OfferStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "countered" => Ok(Self::Countered),
            "under_negotiation" => Ok(Self::UnderNegotiation),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseEnumError::InvalidValue("OfferStatus", s.to_string())),
        }
    }
}
