//! # Negotiation Primitives
//!
//! Traits and records shared by every listing/bid pair.
//!
//! A [`Listing`] is something suppliers bid on (a request or a group
//! request). A [`Bid`] is an offer against one listing. The generic
//! negotiation engine only talks to these two traits, so the request/offer
//! and group-request/group-offer flows run through identical rules.
//!
//! A bid never changes status on its own: every move is described by a
//! [`NegotiationStep`] and handed to [`Bid::apply`], which validates the
//! transition and records it.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::offer_status::OfferStatus;
use crate::domain::value_objects::{Price, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message attached to bids rejected because a rival was accepted.
pub const OUTBID_MESSAGE: &str = "Another offer was accepted";

/// Message attached to bids rejected because their listing expired.
pub const EXPIRED_MESSAGE: &str = "Listing expired";

/// Message attached to bids rejected because the owner closed the listing.
pub const CLOSED_MESSAGE: &str = "Listing closed by owner";

/// Side of a negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationParty {
    /// The bidding supplier.
    Supplier,
    /// The listing owner: the vendor of a request, the leader of a group.
    Owner,
}

impl fmt::Display for NegotiationParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Supplier => "supplier",
            Self::Owner => "owner",
        };
        write!(f, "{s}")
    }
}

/// Kind of negotiation move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationAction {
    /// The supplier placed the bid.
    InitialOffer,
    /// New terms from either side.
    CounterOffer,
    /// The current terms were agreed.
    Accept,
    /// The bid was turned down.
    Reject,
}

impl fmt::Display for NegotiationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InitialOffer => "initial_offer",
            Self::CounterOffer => "counter_offer",
            Self::Accept => "accept",
            Self::Reject => "reject",
        };
        write!(f, "{s}")
    }
}

/// Partial terms carried by a counter. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermsUpdate {
    /// New per-unit price.
    pub offered_price: Option<Price>,
    /// New delivery estimate.
    pub eta: Option<String>,
    /// New notes.
    pub notes: Option<String>,
}

impl TermsUpdate {
    /// Terms that change only the price.
    #[must_use]
    pub fn price(offered_price: Price) -> Self {
        Self {
            offered_price: Some(offered_price),
            ..Self::default()
        }
    }

    /// Sets the delivery estimate.
    #[must_use]
    pub fn with_eta(mut self, eta: impl Into<String>) -> Self {
        self.eta = Some(eta.into());
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Returns true if nothing would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offered_price.is_none() && self.eta.is_none() && self.notes.is_none()
    }

    /// Rejects an explicitly blank eta.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if `eta` is present but blank.
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(eta) = &self.eta
            && eta.trim().is_empty()
        {
            return Err(DomainError::validation("eta must not be empty"));
        }
        Ok(())
    }

    /// Writes the present fields over the given terms.
    pub(crate) fn apply_to(self, price: &mut Price, eta: &mut String, notes: &mut String) {
        if let Some(p) = self.offered_price {
            *price = p;
        }
        if let Some(e) = self.eta {
            *eta = e.trim().to_string();
        }
        if let Some(n) = self.notes {
            *notes = n.trim().to_string();
        }
    }
}

/// A validated move the engine asks a bid to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationStep {
    /// Who moves.
    pub party: NegotiationParty,
    /// What kind of move it is.
    pub action: NegotiationAction,
    /// Status the bid ends up in.
    pub to: OfferStatus,
    /// Terms to overwrite (counters only).
    pub terms: TermsUpdate,
    /// Free-text note for the history.
    pub message: Option<String>,
    /// When the move happens.
    pub at: Timestamp,
}

impl NegotiationStep {
    /// Creates a step without terms or message.
    #[must_use]
    pub fn new(
        party: NegotiationParty,
        action: NegotiationAction,
        to: OfferStatus,
        at: Timestamp,
    ) -> Self {
        Self {
            party,
            action,
            to,
            terms: TermsUpdate::default(),
            message: None,
            at,
        }
    }

    /// Attaches counter terms.
    #[must_use]
    pub fn with_terms(mut self, terms: TermsUpdate) -> Self {
        self.terms = terms;
        self
    }

    /// Attaches a message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// One line of a group offer's append-only negotiation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationEntry {
    /// Who moved.
    pub party: NegotiationParty,
    /// What they did.
    pub action: NegotiationAction,
    /// Per-unit price after the move.
    pub offered_price: Price,
    /// Total price after the move.
    pub total_price: Decimal,
    /// Optional note.
    pub message: Option<String>,
    /// When it happened.
    pub timestamp: Timestamp,
}

/// Something suppliers bid on.
pub trait Listing {
    /// Identifier type of the listing.
    type Id: Copy + Eq + fmt::Display;

    /// Human readable kind, used in error messages.
    const KIND: &'static str;

    /// Returns the listing id.
    fn listing_id(&self) -> Self::Id;

    /// Returns the user allowed to accept, reject and counter.
    fn owner(&self) -> &UserId;

    /// Returns true if bids may still be placed, countered or accepted.
    fn is_open_at(&self, now: Timestamp) -> bool;
}

/// A supplier's bid on a [`Listing`].
pub trait Bid {
    /// Identifier type of the listing this bid targets.
    type ListingId: Copy + Eq + fmt::Display;

    /// Status the bid moves to once the supplier answers a counter.
    const RESPONDED: OfferStatus;

    /// Returns the id of the targeted listing.
    fn listing_id(&self) -> Self::ListingId;

    /// Returns the bidding supplier.
    fn bidder(&self) -> &UserId;

    /// Returns the current status.
    fn status(&self) -> OfferStatus;

    /// Performs a negotiation step.
    ///
    /// # Errors
    ///
    /// - `DomainError::OfferFinalized` if the bid is accepted or rejected
    /// - `DomainError::InvalidOfferTransition` if the status table forbids the move
    fn apply(&mut self, step: NegotiationStep) -> DomainResult<()>;
}

/// Checks `from -> to` against the status table.
///
/// # Errors
///
/// - `DomainError::OfferFinalized` if `from` is terminal
/// - `DomainError::InvalidOfferTransition` otherwise when the move is not allowed
pub(crate) fn check_transition(from: OfferStatus, to: OfferStatus) -> DomainResult<()> {
    if from.is_terminal() {
        return Err(DomainError::OfferFinalized { status: from });
    }
    if !from.can_transition_to(to) {
        return Err(DomainError::InvalidOfferTransition { from, to });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn terms_update_keeps_missing_fields() {
        let mut price = Price::new(10).unwrap();
        let mut eta = "2 days".to_string();
        let mut notes = "fresh".to_string();

        TermsUpdate::price(Price::new(9).unwrap()).apply_to(&mut price, &mut eta, &mut notes);

        assert_eq!(price, Price::new(9).unwrap());
        assert_eq!(eta, "2 days");
        assert_eq!(notes, "fresh");
    }

    #[test]
    fn blank_eta_is_invalid() {
        let terms = TermsUpdate::default().with_eta("   ");
        assert!(terms.validate().is_err());
        assert!(TermsUpdate::default().validate().is_ok());
        assert!(TermsUpdate::default().is_empty());
    }

    #[test]
    fn finalized_bids_cannot_move() {
        let err = check_transition(OfferStatus::Accepted, OfferStatus::Rejected).unwrap_err();
        assert_eq!(
            err,
            DomainError::OfferFinalized {
                status: OfferStatus::Accepted
            }
        );
    }

    #[test]
    fn table_violations_are_reported() {
        let err = check_transition(OfferStatus::Pending, OfferStatus::Pending).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOfferTransition { .. }));
    }

    #[test]
    fn history_entry_serializes_snake_case() {
        let entry = NegotiationEntry {
            party: NegotiationParty::Owner,
            action: NegotiationAction::CounterOffer,
            offered_price: Price::new(11).unwrap(),
            total_price: Decimal::from(550),
            message: None,
            timestamp: Timestamp::from_secs(0).unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["party"], "owner");
        assert_eq!(json["action"], "counter_offer");
    }
}
