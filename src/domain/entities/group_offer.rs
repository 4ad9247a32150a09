//! # Group Offer Entity
//!
//! A supplier's bid on a [`GroupRequest`](crate::domain::entities::group_request::GroupRequest).
//!
//! Group offers carry a total price (unit price times the pooled quantity)
//! and an append-only negotiation log. Every applied step adds exactly one
//! [`NegotiationEntry`]; entries are never edited, removed or reordered.

use crate::domain::entities::negotiation::{
    Bid, NegotiationAction, NegotiationEntry, NegotiationParty, NegotiationStep, check_transition,
};
use crate::domain::entities::offer::{DeliveryOptions, OfferTerms};
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::offer_status::OfferStatus;
use crate::domain::value_objects::{GroupOfferId, GroupRequestId, Price, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// History message used when the supplier gives no notes on creation.
pub const INITIAL_OFFER_MESSAGE: &str = "Initial offer";

/// A supplier's offer on a group request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOffer {
    id: GroupOfferId,
    group_request_id: GroupRequestId,
    supplier_id: UserId,
    offered_price: Price,
    quantity_factor: Decimal,
    total_price: Decimal,
    eta: String,
    notes: String,
    delivery_options: DeliveryOptions,
    status: OfferStatus,
    last_actor: NegotiationParty,
    negotiation_history: Vec<NegotiationEntry>,
    viewed_at: Option<Timestamp>,
    created_at: Timestamp,
    updated_at: Timestamp,
    version: u64,
}

impl GroupOffer {
    /// Creates a pending group offer with its `initial_offer` history entry.
    ///
    /// `quantity_factor` is the numeric quantity of the group request; the
    /// total price is always `offered_price * quantity_factor`.
    ///
    /// # Errors
    ///
    /// - `DomainError::ValidationError` if the terms are invalid
    /// - `DomainError::ArithmeticOverflow` if the total price overflows
    pub fn new(
        group_request_id: GroupRequestId,
        supplier_id: UserId,
        terms: OfferTerms,
        quantity_factor: Decimal,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let terms = terms.validated()?;
        let total_price = terms.offered_price.total_for(quantity_factor)?;
        let message = if terms.notes.is_empty() {
            INITIAL_OFFER_MESSAGE.to_string()
        } else {
            terms.notes.clone()
        };

        Ok(Self {
            id: GroupOfferId::new_v4(),
            group_request_id,
            supplier_id,
            offered_price: terms.offered_price,
            quantity_factor,
            total_price,
            eta: terms.eta,
            notes: terms.notes,
            delivery_options: terms.delivery_options,
            status: OfferStatus::Pending,
            last_actor: NegotiationParty::Supplier,
            negotiation_history: vec![NegotiationEntry {
                party: NegotiationParty::Supplier,
                action: NegotiationAction::InitialOffer,
                offered_price: terms.offered_price,
                total_price,
                message: Some(message),
                timestamp: now,
            }],
            viewed_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    /// Returns the group offer ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> GroupOfferId {
        self.id
    }

    /// Returns the targeted group request.
    #[inline]
    #[must_use]
    pub fn group_request_id(&self) -> GroupRequestId {
        self.group_request_id
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

    /// Returns the numeric quantity the total is computed from.
    #[inline]
    #[must_use]
    pub fn quantity_factor(&self) -> Decimal {
        self.quantity_factor
    }

    /// Returns the total price for the pooled quantity.
    #[inline]
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.total_price
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

    /// Returns the negotiation log, oldest first.
    #[inline]
    #[must_use]
    pub fn negotiation_history(&self) -> &[NegotiationEntry] {
        &self.negotiation_history
    }

    /// Returns when the leader first looked at this offer.
    #[inline]
    #[must_use]
    pub fn viewed_at(&self) -> Option<Timestamp> {
        self.viewed_at
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

    /// Records the first time the leader viewed the offer.
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

impl Bid for GroupOffer {
    type ListingId = GroupRequestId;
    const RESPONDED: OfferStatus = OfferStatus::UnderNegotiation;

    fn listing_id(&self) -> GroupRequestId {
        self.group_request_id
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

        let new_price = step.terms.offered_price.unwrap_or(self.offered_price);
        let total_price = new_price.total_for(self.quantity_factor)?;

        step.terms
            .apply_to(&mut self.offered_price, &mut self.eta, &mut self.notes);
        self.total_price = total_price;
        self.status = step.to;
        self.last_actor = step.party;
        self.updated_at = step.at;
        self.negotiation_history.push(NegotiationEntry {
            party: step.party,
            action: step.action,
            offered_price: self.offered_price,
            total_price: self.total_price,
            message: step.message,
            timestamp: step.at,
        });
        Ok(())
    }
}

impl fmt::Display for GroupOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GroupOffer({} by {} @ {} total {} [{}])",
            self.id,
            self.supplier_id,
            self.offered_price,
            self.total_price.normalize(),
            self.status
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::negotiation::TermsUpdate;
    use crate::domain::errors::DomainError;

    fn now() -> Timestamp {
        Timestamp::from_secs(1_704_067_200).unwrap()
    }

    fn offer() -> GroupOffer {
        GroupOffer::new(
            GroupRequestId::new_v4(),
            UserId::new("supplier-1"),
            OfferTerms::new(Price::new(12).unwrap(), "3 days"),
            Decimal::from(50),
            now(),
        )
        .unwrap()
    }

    #[test]
    fn total_price_uses_quantity_factor() {
        let o = offer();
        assert_eq!(o.total_price(), Decimal::from(600));
        assert_eq!(o.negotiation_history().len(), 1);
        let first = &o.negotiation_history()[0];
        assert_eq!(first.action, NegotiationAction::InitialOffer);
        assert_eq!(first.message.as_deref(), Some(INITIAL_OFFER_MESSAGE));
    }

    #[test]
    fn counter_recomputes_total_and_appends() {
        let mut o = offer();
        o.apply(
            NegotiationStep::new(
                NegotiationParty::Owner,
                NegotiationAction::CounterOffer,
                OfferStatus::Countered,
                now().add_secs(10),
            )
            .with_terms(TermsUpdate::price(Price::new(10).unwrap())),
        )
        .unwrap();

        assert_eq!(o.total_price(), Decimal::from(500));
        assert_eq!(o.status(), OfferStatus::Countered);
        assert_eq!(o.negotiation_history().len(), 2);
        assert_eq!(o.negotiation_history()[1].total_price, Decimal::from(500));
        assert_eq!(o.negotiation_history()[0].total_price, Decimal::from(600));
    }

    #[test]
    fn failed_step_leaves_history_untouched() {
        let mut o = offer();
        let err = o
            .apply(NegotiationStep::new(
                NegotiationParty::Supplier,
                NegotiationAction::Accept,
                OfferStatus::UnderNegotiation,
                now(),
            ))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidOfferTransition { .. }));
        assert_eq!(o.negotiation_history().len(), 1);
        assert_eq!(o.status(), OfferStatus::Pending);
    }
}
