//! # Negotiation Service
//!
//! Placing, countering, answering, rejecting and withdrawing bids on
//! requests and group requests.
//!
//! The rules live in [`NegotiationEngine`]; this service loads the listing
//! and bid, runs the rule, and writes the bid back under its version. A
//! version conflict re-reads both and runs the rule again.
//!
//! Accepting a bid is the settlement coordinator's job.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::context::MarketplaceContext;
use crate::domain::entities::group_offer::GroupOffer;
use crate::domain::entities::group_request::GroupListing;
use crate::domain::entities::negotiation::{NegotiationParty, TermsUpdate};
use crate::domain::entities::offer::{Offer, OfferTerms};
use crate::domain::events::{
    BidRef, EventMetadata, ListingRef, OfferCountered, OfferPlaced, OfferRejected, OfferWithdrawn,
};
use crate::domain::services::negotiation::{CounterResponse, NegotiationEngine};
use crate::domain::services::quantity_aggregation::QuantityAggregator;
use crate::domain::value_objects::{
    Actor, GroupOfferId, GroupRequestId, OfferId, OfferStatus, Price, RequestId, Timestamp,
};
use crate::infrastructure::persistence::WriteBatch;
use std::sync::Arc;
use tracing::{debug, info};

/// Bid lifecycle short of acceptance.
#[derive(Debug, Clone)]
pub struct NegotiationService {
    ctx: Arc<MarketplaceContext>,
}

impl NegotiationService {
    /// Creates the service.
    #[must_use]
    pub fn new(ctx: Arc<MarketplaceContext>) -> Self {
        Self { ctx }
    }

    // ========== Requests ==========

    /// Places a supplier's offer on an open request.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor is not a supplier
    /// - `InvalidState` if the request is not open, or the supplier already
    ///   holds a live offer on it
    /// - `Validation` for invalid terms
    pub async fn create_offer(
        &self,
        actor: &Actor,
        request_id: RequestId,
        terms: OfferTerms,
    ) -> ApplicationResult<Offer> {
        actor.require_supplier()?;
        let offer = self
            .ctx
            .retry
            .run("create_offer", || {
                let terms = terms.clone();
                async move {
                    let now = self.ctx.now();
                    let request = self.ctx.load_request(request_id).await?;
                    if !request.is_open_at(now) {
                        return Err(ApplicationError::invalid_state(
                            "request is no longer accepting offers",
                        ));
                    }

                    let existing = self.ctx.repos.offers.find_by_request(&request_id).await?;
                    if existing
                        .iter()
                        .any(|o| actor.is(o.supplier_id()) && o.status() != OfferStatus::Rejected)
                    {
                        return Err(ApplicationError::invalid_state(
                            "you have already made an offer on this request",
                        ));
                    }

                    // The touch fails the batch if the request was settled,
                    // closed or deleted after the checks above.
                    let offer = Offer::new(request_id, actor.id().clone(), terms, now)?;
                    let mut batch = WriteBatch::new();
                    batch.touch_request(request).insert_offer(offer.clone());
                    self.ctx.repos.unit_of_work.commit(batch).await?;
                    Ok(offer)
                }
            })
            .await?;

        info!(offer_id = %offer.id(), request_id = %request_id, supplier = %actor.id(), "offer placed");
        self.ctx
            .publish(OfferPlaced {
                metadata: EventMetadata::at(offer.created_at()),
                listing: request_id.into(),
                bid: offer.id().into(),
                supplier_id: actor.id().clone(),
                offered_price: offer.offered_price(),
            })
            .await;
        Ok(offer)
    }

    /// Owner proposes new terms on an offer.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor owns the request
    /// - `InvalidState` if the offer is final or the request is closed
    /// - `Validation` if no term changes
    pub async fn counter_offer(
        &self,
        actor: &Actor,
        offer_id: OfferId,
        terms: TermsUpdate,
    ) -> ApplicationResult<Offer> {
        let offer = self
            .ctx
            .retry
            .run("counter_offer", || {
                let terms = terms.clone();
                async move {
                    let mut offer = self.ctx.load_offer(offer_id).await?;
                    let request = self.ctx.load_request(offer.request_id()).await?;
                    NegotiationEngine::counter(&request, &mut offer, actor, terms, self.ctx.now())?;
                    Ok(self.ctx.repos.offers.update(&offer).await?)
                }
            })
            .await?;

        info!(offer_id = %offer_id, price = %offer.offered_price(), "owner countered offer");
        self.publish_counter(
            offer.request_id().into(),
            offer_id.into(),
            NegotiationParty::Owner,
            offer.offered_price(),
            offer.updated_at(),
        )
        .await;
        Ok(offer)
    }

    /// Supplier accepts or counters the owner's counter.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor made the offer
    /// - `InvalidState` if there is no counter to answer or the request is closed
    pub async fn respond_to_counter(
        &self,
        actor: &Actor,
        offer_id: OfferId,
        response: CounterResponse,
    ) -> ApplicationResult<Offer> {
        let countered = matches!(response, CounterResponse::Counter(_));
        let offer = self
            .ctx
            .retry
            .run("respond_to_counter", || {
                let response = response.clone();
                async move {
                    let mut offer = self.ctx.load_offer(offer_id).await?;
                    let request = self.ctx.load_request(offer.request_id()).await?;
                    NegotiationEngine::respond(&request, &mut offer, actor, response, self.ctx.now())?;
                    Ok(self.ctx.repos.offers.update(&offer).await?)
                }
            })
            .await?;

        info!(offer_id = %offer_id, countered, "supplier answered counter");
        if countered {
            self.publish_counter(
                offer.request_id().into(),
                offer_id.into(),
                NegotiationParty::Supplier,
                offer.offered_price(),
                offer.updated_at(),
            )
            .await;
        }
        Ok(offer)
    }

    /// Owner turns an offer down.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor owns the request
    /// - `InvalidState` if the offer is already final
    pub async fn reject_offer(&self, actor: &Actor, offer_id: OfferId) -> ApplicationResult<Offer> {
        let offer = self
            .ctx
            .retry
            .run("reject_offer", || async move {
                let mut offer = self.ctx.load_offer(offer_id).await?;
                let request = self.ctx.load_request(offer.request_id()).await?;
                NegotiationEngine::reject(&request, &mut offer, actor, self.ctx.now())?;
                Ok(self.ctx.repos.offers.update(&offer).await?)
            })
            .await?;

        info!(offer_id = %offer_id, "offer rejected");
        self.ctx
            .publish(OfferRejected {
                metadata: EventMetadata::at(offer.updated_at()),
                listing: offer.request_id().into(),
                bid: offer_id.into(),
            })
            .await;
        Ok(offer)
    }

    /// Lists every offer on the actor's request, oldest first, marking
    /// unseen ones as viewed.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` unless the actor owns the request.
    pub async fn list_offers_for_request(
        &self,
        actor: &Actor,
        request_id: RequestId,
    ) -> ApplicationResult<Vec<Offer>> {
        actor.require_vendor()?;
        let request = self.ctx.load_request(request_id).await?;
        if !actor.is(request.owner_id()) {
            return Err(ApplicationError::forbidden(
                "only the request owner can view its offers",
            ));
        }

        let now = self.ctx.now();
        let offers = self.ctx.repos.offers.find_by_request(&request_id).await?;
        let mut listed = Vec::with_capacity(offers.len());
        for mut offer in offers {
            if offer.mark_viewed(now) {
                match self.ctx.repos.offers.update(&offer).await {
                    Ok(stored) => offer = stored,
                    Err(err) if err.is_version_conflict() => {
                        debug!(offer_id = %offer.id(), "offer changed while marking viewed");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            listed.push(offer);
        }
        Ok(listed)
    }

    /// Lists the actor's offers, optionally in one status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` if the actor is not a supplier.
    pub async fn list_my_offers(
        &self,
        actor: &Actor,
        status: Option<OfferStatus>,
    ) -> ApplicationResult<Vec<Offer>> {
        actor.require_supplier()?;
        Ok(self
            .ctx
            .repos
            .offers
            .find_by_supplier(actor.id(), status)
            .await?)
    }

    /// Deletes the actor's own offer unless it was accepted.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor made the offer
    /// - `InvalidState` if the offer was accepted
    pub async fn withdraw_offer(&self, actor: &Actor, offer_id: OfferId) -> ApplicationResult<()> {
        actor.require_supplier()?;
        let offer = self
            .ctx
            .retry
            .run("withdraw_offer", || async move {
                let offer = self.ctx.load_offer(offer_id).await?;
                if !actor.is(offer.supplier_id()) {
                    return Err(ApplicationError::forbidden(
                        "only the supplier who made the offer can withdraw it",
                    ));
                }
                if offer.status() == OfferStatus::Accepted {
                    return Err(ApplicationError::invalid_state(
                        "cannot withdraw an accepted offer",
                    ));
                }
                let mut batch = WriteBatch::new();
                batch.delete_offer(offer.clone());
                self.ctx.repos.unit_of_work.commit(batch).await?;
                Ok(offer)
            })
            .await?;

        info!(offer_id = %offer_id, supplier = %actor.id(), "offer withdrawn");
        self.ctx
            .publish(OfferWithdrawn {
                metadata: EventMetadata::at(self.ctx.now()),
                listing: offer.request_id().into(),
                bid: offer_id.into(),
                supplier_id: actor.id().clone(),
            })
            .await;
        Ok(())
    }

    // ========== Group requests ==========

    /// Places a supplier's offer on an active group request.
    ///
    /// The total price is the per-unit price times the pooled quantity.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor is not a supplier
    /// - `InvalidState` if the group request is not active, or the supplier
    ///   already holds a live offer on it
    /// - `Validation` for invalid terms
    pub async fn create_group_offer(
        &self,
        actor: &Actor,
        group_request_id: GroupRequestId,
        terms: OfferTerms,
    ) -> ApplicationResult<GroupOffer> {
        actor.require_supplier()?;
        let offer = self
            .ctx
            .retry
            .run("create_group_offer", || {
                let terms = terms.clone();
                async move {
                    let now = self.ctx.now();
                    let request = self.ctx.load_group_request(group_request_id).await?;
                    if !request.is_open_at(now) {
                        return Err(ApplicationError::invalid_state(
                            "group request is no longer accepting offers",
                        ));
                    }

                    let existing = self
                        .ctx
                        .repos
                        .group_offers
                        .find_by_group_request(&group_request_id)
                        .await?;
                    if existing
                        .iter()
                        .any(|o| actor.is(o.supplier_id()) && o.status() != OfferStatus::Rejected)
                    {
                        return Err(ApplicationError::invalid_state(
                            "you have already made an offer on this group request",
                        ));
                    }

                    let factor = QuantityAggregator::quantity_factor(request.quantity());
                    let offer =
                        GroupOffer::new(group_request_id, actor.id().clone(), terms, factor, now)?;
                    let mut batch = WriteBatch::new();
                    batch.touch_group_request(request).insert_group_offer(offer.clone());
                    self.ctx.repos.unit_of_work.commit(batch).await?;
                    Ok(offer)
                }
            })
            .await?;

        info!(
            group_offer_id = %offer.id(),
            group_request_id = %group_request_id,
            supplier = %actor.id(),
            total_price = %offer.total_price(),
            "group offer placed"
        );
        self.ctx
            .publish(OfferPlaced {
                metadata: EventMetadata::at(offer.created_at()),
                listing: group_request_id.into(),
                bid: offer.id().into(),
                supplier_id: actor.id().clone(),
                offered_price: offer.offered_price(),
            })
            .await;
        Ok(offer)
    }

    /// Group leader proposes new terms.
    ///
    /// The leader's first counter also moves the group to negotiating, in
    /// the same write.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor currently leads the group
    /// - `InvalidState` if the offer is final or the group request is closed
    /// - `Validation` if no term changes
    pub async fn counter_group_offer(
        &self,
        actor: &Actor,
        offer_id: GroupOfferId,
        terms: TermsUpdate,
    ) -> ApplicationResult<GroupOffer> {
        self.ctx
            .retry
            .run("counter_group_offer", || {
                let terms = terms.clone();
                async move {
                    let now = self.ctx.now();
                    let mut offer = self.ctx.load_group_offer(offer_id).await?;
                    let (request, mut group) =
                        self.ctx.load_group_listing(offer.group_request_id()).await?;
                    {
                        let listing = GroupListing::new(&request, &group)?;
                        NegotiationEngine::counter(&listing, &mut offer, actor, terms, now)?;
                    }

                    let mut batch = WriteBatch::new();
                    batch.update_group_offer(offer);
                    if group.start_negotiating(now) {
                        batch.update_group(group);
                    }
                    self.ctx.repos.unit_of_work.commit(batch).await?;
                    Ok(())
                }
            })
            .await?;

        let offer = self.ctx.load_group_offer(offer_id).await?;
        info!(group_offer_id = %offer_id, price = %offer.offered_price(), "leader countered group offer");
        self.publish_counter(
            offer.group_request_id().into(),
            offer_id.into(),
            NegotiationParty::Owner,
            offer.offered_price(),
            offer.updated_at(),
        )
        .await;
        Ok(offer)
    }

    /// Supplier accepts or counters the leader's counter.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor made the offer
    /// - `InvalidState` if there is no counter to answer or the group request is closed
    pub async fn respond_to_group_counter(
        &self,
        actor: &Actor,
        offer_id: GroupOfferId,
        response: CounterResponse,
    ) -> ApplicationResult<GroupOffer> {
        let countered = matches!(response, CounterResponse::Counter(_));
        let offer = self
            .ctx
            .retry
            .run("respond_to_group_counter", || {
                let response = response.clone();
                async move {
                    let mut offer = self.ctx.load_group_offer(offer_id).await?;
                    let (request, group) =
                        self.ctx.load_group_listing(offer.group_request_id()).await?;
                    let listing = GroupListing::new(&request, &group)?;
                    NegotiationEngine::respond(&listing, &mut offer, actor, response, self.ctx.now())?;
                    Ok(self.ctx.repos.group_offers.update(&offer).await?)
                }
            })
            .await?;

        info!(group_offer_id = %offer_id, countered, "supplier answered group counter");
        if countered {
            self.publish_counter(
                offer.group_request_id().into(),
                offer_id.into(),
                NegotiationParty::Supplier,
                offer.offered_price(),
                offer.updated_at(),
            )
            .await;
        }
        Ok(offer)
    }

    /// Group leader turns an offer down.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor currently leads the group
    /// - `InvalidState` if the offer is already final
    pub async fn reject_group_offer(
        &self,
        actor: &Actor,
        offer_id: GroupOfferId,
    ) -> ApplicationResult<GroupOffer> {
        let offer = self
            .ctx
            .retry
            .run("reject_group_offer", || async move {
                let mut offer = self.ctx.load_group_offer(offer_id).await?;
                let (request, group) = self.ctx.load_group_listing(offer.group_request_id()).await?;
                let listing = GroupListing::new(&request, &group)?;
                NegotiationEngine::reject(&listing, &mut offer, actor, self.ctx.now())?;
                Ok(self.ctx.repos.group_offers.update(&offer).await?)
            })
            .await?;

        info!(group_offer_id = %offer_id, "group offer rejected");
        self.ctx
            .publish(OfferRejected {
                metadata: EventMetadata::at(offer.updated_at()),
                listing: offer.group_request_id().into(),
                bid: offer_id.into(),
            })
            .await;
        Ok(offer)
    }

    /// Lists every offer on the group request, oldest first, marking unseen
    /// ones as viewed.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` unless the actor currently leads the group.
    pub async fn list_group_offers(
        &self,
        actor: &Actor,
        group_request_id: GroupRequestId,
    ) -> ApplicationResult<Vec<GroupOffer>> {
        let (_, group) = self.ctx.load_group_listing(group_request_id).await?;
        if !group.is_leader(actor.id()) {
            return Err(ApplicationError::forbidden(
                "only the group leader can view group offers",
            ));
        }

        let now = self.ctx.now();
        let offers = self
            .ctx
            .repos
            .group_offers
            .find_by_group_request(&group_request_id)
            .await?;
        let mut listed = Vec::with_capacity(offers.len());
        for mut offer in offers {
            if offer.mark_viewed(now) {
                match self.ctx.repos.group_offers.update(&offer).await {
                    Ok(stored) => offer = stored,
                    Err(err) if err.is_version_conflict() => {
                        debug!(group_offer_id = %offer.id(), "group offer changed while marking viewed");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            listed.push(offer);
        }
        Ok(listed)
    }

    /// Lists the actor's group offers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` if the actor is not a supplier.
    pub async fn list_my_group_offers(&self, actor: &Actor) -> ApplicationResult<Vec<GroupOffer>> {
        actor.require_supplier()?;
        Ok(self
            .ctx
            .repos
            .group_offers
            .find_by_supplier(actor.id())
            .await?)
    }

    async fn publish_counter(
        &self,
        listing: ListingRef,
        bid: BidRef,
        party: NegotiationParty,
        offered_price: Price,
        at: Timestamp,
    ) {
        self.ctx
            .publish(OfferCountered {
                metadata: EventMetadata::at(at),
                listing,
                bid,
                party,
                offered_price,
            })
            .await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::services::clock::{Clock, ManualClock};
    use crate::application::services::context::Repositories;
    use crate::config::MarketplaceConfig;
    use crate::domain::entities::group::{Group, GroupBuilder};
    use crate::domain::entities::group_request::GroupRequest;
    use crate::domain::entities::request::{Request, RequestBuilder};
    use crate::domain::value_objects::{GroupStatus, Quantity, UserId};
    use crate::infrastructure::persistence::{
        GroupRepository, GroupRequestRepository, InMemoryStore, RequestRepository,
    };
    use rust_decimal::Decimal;

    struct Fixture {
        store: InMemoryStore,
        clock: Arc<ManualClock>,
        service: NegotiationService,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1_704_067_200).unwrap()));
        let ctx = MarketplaceContext::new(
            Repositories::in_memory(store.clone()),
            MarketplaceConfig::default(),
        )
        .with_clock(clock.clone());
        Fixture {
            store,
            clock,
            service: NegotiationService::new(Arc::new(ctx)),
        }
    }

    fn price(value: i64) -> Price {
        Price::new(value).unwrap()
    }

    fn terms(value: i64) -> OfferTerms {
        OfferTerms::new(price(value), "2 days")
    }

    async fn open_request(f: &Fixture) -> Request {
        let now = f.clock.now();
        let request = RequestBuilder::new(
            UserId::new("vendor-1"),
            "Chillies",
            Quantity::parse("5kg").unwrap(),
            price(200),
            "Guntur",
            now.add_days(7),
        )
        .build(now)
        .unwrap();
        RequestRepository::insert(&f.store, &request).await.unwrap();
        request
    }

    async fn open_group_request(f: &Fixture) -> (Group, GroupRequest) {
        let now = f.clock.now();
        let mut group = GroupBuilder::new(
            UserId::new("leader"),
            "Spice buyers",
            "Turmeric",
            Quantity::parse("30kg").unwrap(),
            price(120),
            "Erode",
            now.add_days(7),
        )
        .build(now)
        .unwrap();
        group.join(UserId::new("member"), Quantity::parse("20kg").unwrap(), now).unwrap();
        let request = GroupRequest::open_for(&group, now.add_days(3), now).unwrap();
        group.open_request(&UserId::new("leader"), now).unwrap();
        GroupRepository::insert(&f.store, &group).await.unwrap();
        GroupRequestRepository::insert(&f.store, &request).await.unwrap();
        (group, request)
    }

    #[tokio::test]
    async fn one_live_offer_per_supplier() {
        let f = fixture();
        let request = open_request(&f).await;
        let supplier = Actor::supplier("supplier-1");

        let offer = f.service.create_offer(&supplier, request.id(), terms(190)).await.unwrap();
        assert_eq!(offer.status(), OfferStatus::Pending);

        let err = f
            .service
            .create_offer(&supplier, request.id(), terms(185))
            .await
            .unwrap_err();
        assert!(err.is_invalid_state());

        f.service
            .reject_offer(&Actor::vendor("vendor-1"), offer.id())
            .await
            .unwrap();
        f.service.create_offer(&supplier, request.id(), terms(180)).await.unwrap();
    }

    #[tokio::test]
    async fn vendors_cannot_bid() {
        let f = fixture();
        let request = open_request(&f).await;
        let err = f
            .service
            .create_offer(&Actor::vendor("vendor-2"), request.id(), terms(190))
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn counter_and_respond_round() {
        let f = fixture();
        let request = open_request(&f).await;
        let supplier = Actor::supplier("supplier-1");
        let offer = f.service.create_offer(&supplier, request.id(), terms(190)).await.unwrap();

        let err = f
            .service
            .counter_offer(&Actor::vendor("intruder"), offer.id(), TermsUpdate::price(price(170)))
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        let countered = f
            .service
            .counter_offer(&Actor::vendor("vendor-1"), offer.id(), TermsUpdate::price(price(170)))
            .await
            .unwrap();
        assert_eq!(countered.status(), OfferStatus::Countered);
        assert_eq!(countered.offered_price(), price(170));

        let err = f
            .service
            .respond_to_counter(&Actor::supplier("supplier-2"), offer.id(), CounterResponse::Accept)
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        let answered = f
            .service
            .respond_to_counter(
                &supplier,
                offer.id(),
                CounterResponse::Counter(TermsUpdate::price(price(180)).with_eta("1 day")),
            )
            .await
            .unwrap();
        assert_eq!(answered.status(), OfferStatus::Pending);
        assert_eq!(answered.offered_price(), price(180));
        assert_eq!(answered.eta(), "1 day");
    }

    #[tokio::test]
    async fn listing_offers_marks_them_viewed() {
        let f = fixture();
        let request = open_request(&f).await;
        f.service
            .create_offer(&Actor::supplier("supplier-1"), request.id(), terms(190))
            .await
            .unwrap();

        let owner = Actor::vendor("vendor-1");
        let offers = f.service.list_offers_for_request(&owner, request.id()).await.unwrap();
        assert_eq!(offers.len(), 1);
        assert!(offers[0].is_viewed());

        let err = f
            .service
            .list_offers_for_request(&Actor::vendor("vendor-2"), request.id())
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn withdraw_removes_own_offer() {
        let f = fixture();
        let request = open_request(&f).await;
        let supplier = Actor::supplier("supplier-1");
        let offer = f.service.create_offer(&supplier, request.id(), terms(190)).await.unwrap();

        let err = f
            .service
            .withdraw_offer(&Actor::supplier("supplier-2"), offer.id())
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        f.service.withdraw_offer(&supplier, offer.id()).await.unwrap();
        assert!(f.service.list_my_offers(&supplier, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_offer_total_uses_pooled_quantity() {
        let f = fixture();
        let (_, request) = open_group_request(&f).await;
        let offer = f
            .service
            .create_group_offer(&Actor::supplier("supplier-1"), request.id(), terms(110))
            .await
            .unwrap();
        assert_eq!(offer.total_price(), Decimal::from(5500));
        assert_eq!(offer.negotiation_history().len(), 1);
    }

    #[tokio::test]
    async fn first_leader_counter_starts_negotiating() {
        let f = fixture();
        let (group, request) = open_group_request(&f).await;
        let supplier = Actor::supplier("supplier-1");
        let offer = f
            .service
            .create_group_offer(&supplier, request.id(), terms(110))
            .await
            .unwrap();

        let err = f
            .service
            .counter_group_offer(&Actor::vendor("member"), offer.id(), TermsUpdate::price(price(100)))
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        let countered = f
            .service
            .counter_group_offer(&Actor::vendor("leader"), offer.id(), TermsUpdate::price(price(100)))
            .await
            .unwrap();
        assert_eq!(countered.status(), OfferStatus::Countered);
        assert_eq!(countered.total_price(), Decimal::from(5000));
        assert_eq!(countered.negotiation_history().len(), 2);

        let stored = GroupRepository::get(&f.store, &group.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), GroupStatus::Negotiating);

        let answered = f
            .service
            .respond_to_group_counter(&supplier, offer.id(), CounterResponse::Accept)
            .await
            .unwrap();
        assert_eq!(answered.status(), OfferStatus::UnderNegotiation);
        assert_eq!(answered.negotiation_history().len(), 3);
    }

    #[tokio::test]
    async fn only_leader_lists_group_offers() {
        let f = fixture();
        let (_, request) = open_group_request(&f).await;
        f.service
            .create_group_offer(&Actor::supplier("supplier-1"), request.id(), terms(110))
            .await
            .unwrap();

        let err = f
            .service
            .list_group_offers(&Actor::vendor("member"), request.id())
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        let offers = f
            .service
            .list_group_offers(&Actor::vendor("leader"), request.id())
            .await
            .unwrap();
        assert_eq!(offers.len(), 1);
        assert!(offers[0].viewed_at().is_some());
    }
}
