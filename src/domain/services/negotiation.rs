//! # Negotiation Engine
//!
//! One set of negotiation rules for every [`Listing`]/[`Bid`] pair.
//!
//! | From | Actor | Action | To |
//! |---|---|---|---|
//! | pending, countered, under negotiation | owner | accept | accepted |
//! | pending, countered, under negotiation | owner | reject | rejected |
//! | pending, countered, under negotiation | owner | counter | countered |
//! | countered | bidder | respond | `Bid::RESPONDED` |
//!
//! Checks run in a fixed order: who is acting (`Forbidden`), then the bid's
//! status (`InvalidState`), then whether the listing is still open
//! (`InvalidState`). Rejecting does not require the listing to be open.
//!
//! The engine only mutates the bid in memory. Persisting it, and the
//! listing-side effects of an accept, are the caller's job.

use crate::domain::entities::negotiation::{
    Bid, Listing, NegotiationAction, NegotiationParty, NegotiationStep, TermsUpdate,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::offer_status::OfferStatus;
use crate::domain::value_objects::{Actor, Role, Timestamp};

/// Default log message for an owner's counter.
pub const OWNER_COUNTER_MESSAGE: &str = "Counter offer from owner";
/// Default log message for a supplier's counter.
pub const SUPPLIER_COUNTER_MESSAGE: &str = "Counter offer from supplier";
/// Default log message when the supplier agrees to a counter.
pub const SUPPLIER_ACCEPT_MESSAGE: &str = "Counter offer accepted by supplier";

/// The supplier's answer to a counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterResponse {
    /// Agree to the owner's terms.
    Accept,
    /// Propose new terms.
    Counter(TermsUpdate),
}

/// Stateless negotiation rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegotiationEngine;

impl NegotiationEngine {
    /// Owner proposes new terms.
    ///
    /// # Errors
    ///
    /// - `DomainError::Forbidden` if the actor is not the listing's owning vendor
    /// - `DomainError::OfferFinalized` if the bid is accepted or rejected
    /// - `DomainError::ListingClosed` if the listing is not open
    /// - `DomainError::ValidationError` if the terms are empty or invalid
    pub fn counter<L, B>(
        listing: &L,
        bid: &mut B,
        actor: &Actor,
        terms: TermsUpdate,
        now: Timestamp,
    ) -> DomainResult<()>
    where
        L: Listing,
        B: Bid<ListingId = L::Id>,
    {
        Self::authorize_owner(listing, bid, actor, "counter")?;
        Self::ensure_active(bid)?;
        Self::ensure_open(listing, now)?;
        if terms.is_empty() {
            return Err(DomainError::validation("a counter must change at least one term"));
        }

        let message = terms
            .notes
            .clone()
            .unwrap_or_else(|| OWNER_COUNTER_MESSAGE.to_string());
        bid.apply(
            NegotiationStep::new(
                NegotiationParty::Owner,
                NegotiationAction::CounterOffer,
                OfferStatus::Countered,
                now,
            )
            .with_terms(terms)
            .with_message(message),
        )
    }

    /// Supplier answers the owner's counter.
    ///
    /// # Errors
    ///
    /// - `DomainError::Forbidden` if the actor is not the bid's supplier
    /// - `DomainError::OfferFinalized` if the bid is accepted or rejected
    /// - `DomainError::InvalidState` if there is no counter to answer
    /// - `DomainError::ListingClosed` if the listing is not open
    pub fn respond<L, B>(
        listing: &L,
        bid: &mut B,
        actor: &Actor,
        response: CounterResponse,
        now: Timestamp,
    ) -> DomainResult<()>
    where
        L: Listing,
        B: Bid<ListingId = L::Id>,
    {
        Self::ensure_same_listing(listing, bid)?;
        actor.require_role(Role::Supplier)?;
        if !actor.is(bid.bidder()) {
            return Err(DomainError::forbidden(
                "only the supplier who made the offer can respond",
            ));
        }
        Self::ensure_active(bid)?;
        if !bid.status().awaits_supplier() {
            return Err(DomainError::invalid_state(format!(
                "no counter offer to respond to (offer is {})",
                bid.status()
            )));
        }
        Self::ensure_open(listing, now)?;

        let step = match response {
            CounterResponse::Accept => NegotiationStep::new(
                NegotiationParty::Supplier,
                NegotiationAction::Accept,
                B::RESPONDED,
                now,
            )
            .with_message(SUPPLIER_ACCEPT_MESSAGE),
            CounterResponse::Counter(terms) => {
                if terms.is_empty() {
                    return Err(DomainError::validation(
                        "a counter must change at least one term",
                    ));
                }
                let message = terms
                    .notes
                    .clone()
                    .unwrap_or_else(|| SUPPLIER_COUNTER_MESSAGE.to_string());
                NegotiationStep::new(
                    NegotiationParty::Supplier,
                    NegotiationAction::CounterOffer,
                    B::RESPONDED,
                    now,
                )
                .with_terms(terms)
                .with_message(message)
            }
        };
        bid.apply(step)
    }

    /// Owner accepts the bid. Only the bid changes here; the caller settles
    /// the listing and rival bids.
    ///
    /// # Errors
    ///
    /// - `DomainError::Forbidden` if the actor is not the listing's owning vendor
    /// - `DomainError::OfferFinalized` if the bid is accepted or rejected
    /// - `DomainError::ListingClosed` if the listing is not open
    pub fn accept<L, B>(listing: &L, bid: &mut B, actor: &Actor, now: Timestamp) -> DomainResult<()>
    where
        L: Listing,
        B: Bid<ListingId = L::Id>,
    {
        Self::authorize_owner(listing, bid, actor, "accept")?;
        Self::ensure_active(bid)?;
        Self::ensure_open(listing, now)?;
        bid.apply(
            NegotiationStep::new(
                NegotiationParty::Owner,
                NegotiationAction::Accept,
                OfferStatus::Accepted,
                now,
            )
            .with_message("Offer accepted"),
        )
    }

    /// Owner turns the bid down.
    ///
    /// # Errors
    ///
    /// - `DomainError::Forbidden` if the actor is not the listing's owning vendor
    /// - `DomainError::OfferFinalized` if the bid is accepted or rejected
    pub fn reject<L, B>(listing: &L, bid: &mut B, actor: &Actor, now: Timestamp) -> DomainResult<()>
    where
        L: Listing,
        B: Bid<ListingId = L::Id>,
    {
        Self::authorize_owner(listing, bid, actor, "reject")?;
        Self::ensure_active(bid)?;
        bid.apply(
            NegotiationStep::new(
                NegotiationParty::Owner,
                NegotiationAction::Reject,
                OfferStatus::Rejected,
                now,
            )
            .with_message("Offer rejected"),
        )
    }

    /// Rejects a still-active bid on the owner's behalf, as part of a
    /// settlement or expiration cascade.
    ///
    /// Returns false (and leaves the bid untouched) if it was already final.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Bid::apply`].
    pub fn reject_on_cascade<B: Bid>(bid: &mut B, reason: &str, now: Timestamp) -> DomainResult<bool> {
        if bid.status().is_terminal() {
            return Ok(false);
        }
        bid.apply(
            NegotiationStep::new(
                NegotiationParty::Owner,
                NegotiationAction::Reject,
                OfferStatus::Rejected,
                now,
            )
            .with_message(reason),
        )?;
        Ok(true)
    }

    fn authorize_owner<L, B>(listing: &L, bid: &B, actor: &Actor, action: &str) -> DomainResult<()>
    where
        L: Listing,
        B: Bid<ListingId = L::Id>,
    {
        Self::ensure_same_listing(listing, bid)?;
        actor.require_role(Role::Vendor)?;
        if !actor.is(listing.owner()) {
            return Err(DomainError::forbidden(format!(
                "only the {} owner can {action} offers",
                L::KIND
            )));
        }
        Ok(())
    }

    fn ensure_same_listing<L, B>(listing: &L, bid: &B) -> DomainResult<()>
    where
        L: Listing,
        B: Bid<ListingId = L::Id>,
    {
        if bid.listing_id() != listing.listing_id() {
            return Err(DomainError::invalid_state(format!(
                "offer is not for {} {}",
                L::KIND,
                listing.listing_id()
            )));
        }
        Ok(())
    }

    fn ensure_active<B: Bid>(bid: &B) -> DomainResult<()> {
        let status = bid.status();
        if status.is_terminal() {
            return Err(DomainError::OfferFinalized { status });
        }
        Ok(())
    }

    fn ensure_open<L: Listing>(listing: &L, now: Timestamp) -> DomainResult<()> {
        if !listing.is_open_at(now) {
            return Err(DomainError::ListingClosed(format!(
                "{} {} is no longer open",
                L::KIND,
                listing.listing_id()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::group::GroupBuilder;
    use crate::domain::entities::group_offer::GroupOffer;
    use crate::domain::entities::group_request::{GroupListing, GroupRequest};
    use crate::domain::entities::negotiation::OUTBID_MESSAGE;
    use crate::domain::entities::offer::{Offer, OfferTerms};
    use crate::domain::entities::request::{Request, RequestBuilder};
    use crate::domain::errors::ErrorKind;
    use crate::domain::value_objects::{Price, Quantity};
    use rust_decimal::Decimal;

    fn now() -> Timestamp {
        Timestamp::from_secs(1_704_067_200).unwrap()
    }

    fn vendor() -> Actor {
        Actor::vendor("vendor-1")
    }

    fn supplier() -> Actor {
        Actor::supplier("supplier-1")
    }

    fn request() -> Request {
        RequestBuilder::new(
            vendor().id().clone(),
            "Tomatoes",
            Quantity::parse("50kg").unwrap(),
            Price::new(12).unwrap(),
            "Pune",
            now().add_days(7),
        )
        .build(now())
        .unwrap()
    }

    fn offer_on(request: &Request) -> Offer {
        Offer::new(
            request.id(),
            supplier().id().clone(),
            OfferTerms::new(Price::new(11).unwrap(), "2 days"),
            now(),
        )
        .unwrap()
    }

    #[test]
    fn counter_respond_accept_cycle() {
        let request = request();
        let mut offer = offer_on(&request);

        NegotiationEngine::counter(
            &request,
            &mut offer,
            &vendor(),
            TermsUpdate::price(Price::new(10).unwrap()),
            now(),
        )
        .unwrap();
        assert_eq!(offer.status(), OfferStatus::Countered);

        NegotiationEngine::respond(&request, &mut offer, &supplier(), CounterResponse::Accept, now())
            .unwrap();
        assert_eq!(offer.status(), OfferStatus::Pending);
        assert_eq!(offer.offered_price(), Price::new(10).unwrap());

        NegotiationEngine::accept(&request, &mut offer, &vendor(), now()).unwrap();
        assert_eq!(offer.status(), OfferStatus::Accepted);
    }

    #[test]
    fn counter_by_non_owner_is_forbidden() {
        let request = request();
        let mut offer = offer_on(&request);
        let err = NegotiationEngine::counter(
            &request,
            &mut offer,
            &Actor::vendor("someone-else"),
            TermsUpdate::price(Price::new(9).unwrap()),
            now(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = NegotiationEngine::counter(
            &request,
            &mut offer,
            &supplier(),
            TermsUpdate::price(Price::new(9).unwrap()),
            now(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(offer.status(), OfferStatus::Pending);
    }

    #[test]
    fn respond_by_non_bidder_is_forbidden() {
        let request = request();
        let mut offer = offer_on(&request);
        NegotiationEngine::counter(
            &request,
            &mut offer,
            &vendor(),
            TermsUpdate::price(Price::new(10).unwrap()),
            now(),
        )
        .unwrap();

        let err = NegotiationEngine::respond(
            &request,
            &mut offer,
            &Actor::supplier("supplier-2"),
            CounterResponse::Accept,
            now(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn respond_without_counter_is_invalid_state() {
        let request = request();
        let mut offer = offer_on(&request);
        let err = NegotiationEngine::respond(
            &request,
            &mut offer,
            &supplier(),
            CounterResponse::Accept,
            now(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn finalized_offer_rejects_everything() {
        let request = request();
        let mut offer = offer_on(&request);
        NegotiationEngine::reject(&request, &mut offer, &vendor(), now()).unwrap();

        let err = NegotiationEngine::accept(&request, &mut offer, &vendor(), now()).unwrap_err();
        assert!(err.to_string().contains("offer already finalized"));
        let err = NegotiationEngine::counter(
            &request,
            &mut offer,
            &vendor(),
            TermsUpdate::price(Price::new(1).unwrap()),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::OfferFinalized { .. }));
    }

    #[test]
    fn accept_requires_open_listing_but_reject_does_not() {
        let request = request();
        let later = now().add_days(8);

        let mut offer = offer_on(&request);
        let err = NegotiationEngine::accept(&request, &mut offer, &vendor(), later).unwrap_err();
        assert!(matches!(err, DomainError::ListingClosed(_)));

        NegotiationEngine::reject(&request, &mut offer, &vendor(), later).unwrap();
        assert_eq!(offer.status(), OfferStatus::Rejected);
    }

    #[test]
    fn empty_counter_is_invalid() {
        let request = request();
        let mut offer = offer_on(&request);
        let err = NegotiationEngine::counter(
            &request,
            &mut offer,
            &vendor(),
            TermsUpdate::default(),
            now(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn group_variant_returns_to_under_negotiation_and_logs() {
        let group = GroupBuilder::new(
            vendor().id().clone(),
            "Tomato pool",
            "Tomatoes",
            Quantity::parse("50kg").unwrap(),
            Price::new(12).unwrap(),
            "Pune",
            now().add_days(7),
        )
        .build(now())
        .unwrap();
        let gr = GroupRequest::open_for(&group, now().add_days(3), now()).unwrap();
        let listing = GroupListing::new(&gr, &group).unwrap();
        let mut offer = GroupOffer::new(
            gr.id(),
            supplier().id().clone(),
            OfferTerms::new(Price::new(12).unwrap(), "3 days"),
            Decimal::from(50),
            now(),
        )
        .unwrap();

        NegotiationEngine::counter(
            &listing,
            &mut offer,
            &vendor(),
            TermsUpdate::price(Price::new(10).unwrap()),
            now(),
        )
        .unwrap();
        NegotiationEngine::respond(
            &listing,
            &mut offer,
            &supplier(),
            CounterResponse::Counter(TermsUpdate::price(Price::new(11).unwrap())),
            now(),
        )
        .unwrap();

        assert_eq!(offer.status(), OfferStatus::UnderNegotiation);
        assert_eq!(offer.total_price(), Decimal::from(550));
        let actions: Vec<_> = offer
            .negotiation_history()
            .iter()
            .map(|e| (e.party, e.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                (NegotiationParty::Supplier, NegotiationAction::InitialOffer),
                (NegotiationParty::Owner, NegotiationAction::CounterOffer),
                (NegotiationParty::Supplier, NegotiationAction::CounterOffer),
            ]
        );
    }

    #[test]
    fn cascade_rejection_skips_final_bids() {
        let request = request();
        let mut offer = offer_on(&request);
        assert!(NegotiationEngine::reject_on_cascade(&mut offer, OUTBID_MESSAGE, now()).unwrap());
        assert!(!NegotiationEngine::reject_on_cascade(&mut offer, OUTBID_MESSAGE, now()).unwrap());
        assert_eq!(offer.status(), OfferStatus::Rejected);
    }

    #[test]
    fn bid_for_another_listing_is_refused() {
        let target = request();
        let other = request();
        let mut offer = offer_on(&other);
        let err = NegotiationEngine::accept(&target, &mut offer, &vendor(), now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(offer.status(), OfferStatus::Pending);
    }
}
