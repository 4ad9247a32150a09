//! # Offer Entity
//!
//! A supplier's bid on an individual [`Request`](crate::domain::entities::request::Request).
//!
//! Offers follow the [`OfferStatus`] state machine. When the supplier
//! answers a counter the offer goes back to `Pending`, returning control to
//! the vendor.

use crate::domain::entities::negotiation::{
    Bid, NegotiationParty, NegotiationStep, check_transition,
};
use crate::domain::entities::request::non_blank;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::offer_status::OfferStatus;
use crate::domain::value_objects::{OfferId, Price, RequestId, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the goods can reach the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOptions {
    /// The vendor may collect.
    pub can_pickup: bool,
    /// The supplier can deliver.
    pub can_deliver: bool,
    /// Extra charge for delivery.
    pub delivery_charge: Decimal,
}

impl DeliveryOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if the delivery charge is negative.
    pub fn validate(&self) -> DomainResult<()> {
        if self.delivery_charge < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "delivery charge must not be negative, got {}",
                self.delivery_charge
            )));
        }
        Ok(())
    }
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            can_pickup: true,
            can_deliver: false,
            delivery_charge: Decimal::ZERO,
        }
    }
}

/// Terms a supplier submits when placing a bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferTerms {
    /// Per-unit price.
    pub offered_price: Price,
    /// Delivery estimate, required.
    pub eta: String,
    /// Optional notes.
    pub notes: String,
    /// Delivery options.
    pub delivery_options: DeliveryOptions,
}

impl OfferTerms {
    /// Creates terms with empty notes and default delivery options.
    #[must_use]
    pub fn new(offered_price: Price, eta: impl Into<String>) -> Self {
        Self {
            offered_price,
            eta: eta.into(),
            notes: String::new(),
            delivery_options: DeliveryOptions::default(),
        }
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Sets the delivery options.
    #[must_use]
    pub fn with_delivery(mut self, delivery_options: DeliveryOptions) -> Self {
        self.delivery_options = delivery_options;
        self
    }

    /// Validates and normalizes the terms.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` for a blank eta or a negative
    /// delivery charge.
    pub fn validated(self) -> DomainResult<Self> {
        self.delivery_options.validate()?;
        Ok(Self {
            offered_price: self.offered_price,
            eta: non_blank("eta", self.eta)?,
            notes: self.notes.trim().to_string(),
            delivery_options: self.delivery_options,
        })
    }
}

/// A supplier's offer on a request.
///
/// # Invariants
///
/// - `eta` is never blank
/// - Once `Accepted` or `Rejected`, nothing changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    id: OfferId,
    request_id: RequestId,
    supplier_id: UserId,
    offered_price: Price,
    eta: String,
    notes: String,
    delivery_options: DeliveryOptions,
    status: OfferStatus,
    last_actor: NegotiationParty,
    viewed_at: Option<Timestamp>,
    created_at: Timestamp,
    updated_at: Timestamp,
    version: u64,
}

impl Offer {
    /// Creates a pending offer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if the terms are invalid.
    pub fn new(
        request_id: RequestId,
        supplier_id: UserId,
        terms: OfferTerms,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let terms = terms.validated()?;
        Ok(Self {
            id: OfferId::new_v4(),
            request_id,
            supplier_id,
            offered_price: terms.offered_price,
            eta: terms.eta,
            notes: terms.notes,
            delivery_options: terms.delivery_options,
            status: OfferStatus::Pending,
            last_actor: NegotiationParty::Supplier,
            viewed_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    /// Returns the offer ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> OfferId {
        self.id
    }

    /// Returns the request this offer targets.
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the supplier.
    #[inline]
    #[must_use]
    pub fn supplier_id(&self) -> &UserId {
        &self.supplier_id
    }

    /// Returns the current per-unit price.
    #[inline]
    #[must_use]
    pub fn offered_price(&self) -> Price {
        self.offered_price
    }

    /// Returns the delivery estimate.
    #[inline]
    #[must_use]
    pub fn eta(&self) -> &str {
        &self.eta
    }

    /// Returns the notes.
    #[inline]
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Returns the delivery options.
    #[inline]
    #[must_use]
    pub fn delivery_options(&self) -> DeliveryOptions {
        self.delivery_options
    }

    /// Returns the status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> OfferStatus {
        self.status
    }

    /// Returns the side that moved last.
    #[inline]
    #[must_use]
    pub fn last_actor(&self) -> NegotiationParty {
        self.last_actor
    }

    /// Returns when the vendor first looked at this offer.
    #[inline]
    #[must_use]
    pub fn viewed_at(&self) -> Option<Timestamp> {
        self.viewed_at
    }

    /// Returns true once the vendor has seen this offer.
    #[inline]
    #[must_use]
    pub fn is_viewed(&self) -> bool {
        self.viewed_at.is_some()
    }

    /// Returns when the offer was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the offer was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns the version for optimistic locking.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Records the first time the vendor viewed the offer.
    ///
    /// Returns true if this call changed anything.
    pub fn mark_viewed(&mut self, now: Timestamp) -> bool {
        if self.viewed_at.is_some() {
            return false;
        }
        self.viewed_at = Some(now);
        true
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Bid for Offer {
    type ListingId = RequestId;
    const RESPONDED: OfferStatus = OfferStatus::Pending;

    fn listing_id(&self) -> RequestId {
        self.request_id
    }

    fn bidder(&self) -> &UserId {
        &self.supplier_id
    }

    fn status(&self) -> OfferStatus {
        self.status
    }

    fn apply(&mut self, step: NegotiationStep) -> DomainResult<()> {
        check_transition(self.status, step.to)?;
        step.terms.validate()?;
        step.terms
            .apply_to(&mut self.offered_price, &mut self.eta, &mut self.notes);
        self.status = step.to;
        self.last_actor = step.party;
        self.updated_at = step.at;
        Ok(())
    }
}

impl fmt::Display for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Offer({} by {} @ {} [{}])",
            self.id, self.supplier_id, self.offered_price, self.status
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::negotiation::{NegotiationAction, TermsUpdate};

    fn now() -> Timestamp {
        Timestamp::from_secs(1_704_067_200).unwrap()
    }

    fn offer() -> Offer {
        Offer::new(
            RequestId::new_v4(),
            UserId::new("supplier-1"),
            OfferTerms::new(Price::new(11).unwrap(), "2 days").with_notes(" organic "),
            now(),
        )
        .unwrap()
    }

    #[test]
    fn new_offer_defaults() {
        let o = offer();
        assert_eq!(o.status(), OfferStatus::Pending);
        assert_eq!(o.last_actor(), NegotiationParty::Supplier);
        assert_eq!(o.notes(), "organic");
        assert_eq!(o.delivery_options(), DeliveryOptions::default());
        assert!(o.delivery_options().can_pickup);
        assert!(!o.is_viewed());
    }

    #[test]
    fn blank_eta_rejected() {
        let result = Offer::new(
            RequestId::new_v4(),
            UserId::new("s"),
            OfferTerms::new(Price::new(1).unwrap(), " "),
            now(),
        );
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn negative_delivery_charge_rejected() {
        let options = DeliveryOptions {
            delivery_charge: Decimal::from(-1),
            ..DeliveryOptions::default()
        };
        let terms = OfferTerms::new(Price::new(1).unwrap(), "1 day").with_delivery(options);
        assert!(terms.validated().is_err());
    }

    #[test]
    fn apply_counter_overwrites_given_terms() {
        let mut o = offer();
        let step = NegotiationStep::new(
            NegotiationParty::Owner,
            NegotiationAction::CounterOffer,
            OfferStatus::Countered,
            now().add_secs(60),
        )
        .with_terms(TermsUpdate::price(Price::new(10).unwrap()));

        o.apply(step).unwrap();

        assert_eq!(o.status(), OfferStatus::Countered);
        assert_eq!(o.offered_price(), Price::new(10).unwrap());
        assert_eq!(o.eta(), "2 days");
        assert_eq!(o.last_actor(), NegotiationParty::Owner);
        assert_eq!(o.updated_at(), now().add_secs(60));
    }

    #[test]
    fn apply_on_finalized_fails() {
        let mut o = offer();
        o.apply(NegotiationStep::new(
            NegotiationParty::Owner,
            NegotiationAction::Reject,
            OfferStatus::Rejected,
            now(),
        ))
        .unwrap();

        let err = o
            .apply(NegotiationStep::new(
                NegotiationParty::Owner,
                NegotiationAction::Accept,
                OfferStatus::Accepted,
                now(),
            ))
            .unwrap_err();
        assert!(matches!(err, DomainError::OfferFinalized { .. }));
    }

    #[test]
    fn mark_viewed_once() {
        let mut o = offer();
        assert!(o.mark_viewed(now()));
        assert!(!o.mark_viewed(now().add_secs(5)));
        assert_eq!(o.viewed_at(), Some(now()));
    }
}
