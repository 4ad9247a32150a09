//! # Domain Errors
//!
//! Error types raised by business rules in the domain layer.
//!
//! Every variant maps onto one of the five failure kinds the marketplace
//! exposes to its callers through [`ErrorKind`].
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::errors::{DomainError, ErrorKind};
//!
//! let err = DomainError::validation("desired price must be positive");
//! assert_eq!(err.kind(), ErrorKind::Validation);
//! ```

use crate::domain::value_objects::UserId;
use crate::domain::value_objects::offer_status::OfferStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure category reported to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed input, rejected before any state change.
    Validation,
    /// A listing, offer or group id could not be resolved.
    NotFound,
    /// The actor is not the owner, leader or bidder the action requires.
    Forbidden,
    /// The transition is not allowed from the current state.
    InvalidState,
    /// Optimistic concurrency retries were exhausted.
    Conflict,
    /// Storage or other infrastructure failure.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidState => "INVALID_STATE",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL",
        };
        write!(f, "{s}")
    }
}

/// Error raised by a domain rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Generic input validation failure.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Quantity string does not match `<number><unit>`.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Price is zero, negative or otherwise unusable.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// Actor lacks the role or ownership required for the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The offer is accepted or rejected and can no longer change.
    #[error("offer already finalized ({status})")]
    OfferFinalized {
        /// The terminal status the offer is in.
        status: OfferStatus,
    },

    /// The negotiation transition table does not allow this move.
    #[error("invalid offer transition from {from} to {to}")]
    InvalidOfferTransition {
        /// Current status.
        from: OfferStatus,
        /// Requested status.
        to: OfferStatus,
    },

    /// The listing no longer accepts bids or settlement.
    #[error("listing is not open: {0}")]
    ListingClosed(String),

    /// The group leader tried to leave while other members remain.
    #[error("leader must assign a new leader before leaving the group")]
    LeaderMustReassign,

    /// The group has reached its member cap.
    #[error("group is full ({max_members} members)")]
    GroupFull {
        /// Configured member cap.
        max_members: u32,
    },

    /// The user is already part of the group.
    #[error("user {0} is already a member of the group")]
    AlreadyMember(UserId),

    /// The user is not part of the group.
    #[error("user {0} is not a member of the group")]
    NotAMember(UserId),

    /// Any other state-machine violation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Decimal arithmetic overflowed.
    #[error("arithmetic overflow: {0}")]
    ArithmeticOverflow(String),
}

impl DomainError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates a generic invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Returns the failure category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError(_)
            | Self::InvalidQuantity(_)
            | Self::InvalidPrice(_)
            | Self::ArithmeticOverflow(_) => ErrorKind::Validation,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::OfferFinalized { .. }
            | Self::InvalidOfferTransition { .. }
            | Self::ListingClosed(_)
            | Self::LeaderMustReassign
            | Self::GroupFull { .. }
            | Self::AlreadyMember(_)
            | Self::NotAMember(_)
            | Self::InvalidState(_) => ErrorKind::InvalidState,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
