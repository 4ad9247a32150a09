//! # Settlement Coordinator
//!
//! Accepting a bid settles its listing in one atomic write:
//!
//! 1. the bid moves to accepted
//! 2. the listing moves to fulfilled (request) or completed (group request)
//!    and records the winning bid
//! 3. every rival still in play is rejected with [`OUTBID_MESSAGE`]
//! 4. for a group request, the group moves to deal closed
//!
//! Every touched document is version checked. If another writer got there
//! first the whole settlement is re-read and retried; a retry that finds the
//! bid or listing already final fails with `InvalidState` and writes nothing.

use crate::application::error::ApplicationResult;
use crate::application::services::context::MarketplaceContext;
use crate::domain::entities::group_offer::GroupOffer;
use crate::domain::entities::group_request::GroupListing;
use crate::domain::entities::negotiation::OUTBID_MESSAGE;
use crate::domain::entities::offer::Offer;
use crate::domain::events::{BidRef, EventMetadata, ListingSettled};
use crate::domain::services::negotiation::NegotiationEngine;
use crate::domain::value_objects::{Actor, GroupOfferId, OfferId};
use crate::infrastructure::persistence::WriteBatch;
use std::sync::Arc;
use tracing::info;

/// Result of a settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement<B> {
    /// The accepted bid as stored.
    pub accepted: B,
    /// Rivals rejected in the same write.
    pub rejected: Vec<BidRef>,
}

/// Accepts bids and settles their listings.
#[derive(Debug, Clone)]
pub struct SettlementCoordinator {
    ctx: Arc<MarketplaceContext>,
}

impl SettlementCoordinator {
    /// Creates the coordinator.
    #[must_use]
    pub fn new(ctx: Arc<MarketplaceContext>) -> Self {
        Self { ctx }
    }

    /// Accepts an offer and fulfils its request.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor owns the request
    /// - `InvalidState` if the offer is final or the request is not open
    /// - `Conflict` if concurrent writers kept winning
    pub async fn accept_offer(
        &self,
        actor: &Actor,
        offer_id: OfferId,
    ) -> ApplicationResult<Settlement<Offer>> {
        let (request_id, rejected) = self
            .ctx
            .retry
            .run("accept_offer", || async move {
                let now = self.ctx.now();
                let mut offer = self.ctx.load_offer(offer_id).await?;
                let mut request = self.ctx.load_request(offer.request_id()).await?;
                NegotiationEngine::accept(&request, &mut offer, actor, now)?;
                request.fulfil(offer_id, now)?;

                let rivals = self.ctx.repos.offers.find_by_request(&request.id()).await?;
                let request_id = request.id();
                let mut batch = WriteBatch::new();
                batch.update_offer(offer);
                batch.update_request(request);
                let mut rejected = Vec::new();
                for mut rival in rivals.into_iter().filter(|o| o.id() != offer_id) {
                    if NegotiationEngine::reject_on_cascade(&mut rival, OUTBID_MESSAGE, now)? {
                        rejected.push(BidRef::from(rival.id()));
                        batch.update_offer(rival);
                    }
                }
                self.ctx.repos.unit_of_work.commit(batch).await?;
                Ok((request_id, rejected))
            })
            .await?;

        let accepted = self.ctx.load_offer(offer_id).await?;
        info!(
            offer_id = %offer_id,
            request_id = %request_id,
            rejected = rejected.len(),
            "offer accepted, request fulfilled"
        );
        self.ctx
            .publish(ListingSettled {
                metadata: EventMetadata::at(accepted.updated_at()),
                listing: request_id.into(),
                accepted: offer_id.into(),
                rejected: rejected.clone(),
            })
            .await;
        Ok(Settlement { accepted, rejected })
    }

    /// Accepts a group offer, completes the group request and closes the
    /// group's deal.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor currently leads the group
    /// - `InvalidState` if the offer is final or the group request is not active
    /// - `Conflict` if concurrent writers kept winning
    pub async fn accept_group_offer(
        &self,
        actor: &Actor,
        offer_id: GroupOfferId,
    ) -> ApplicationResult<Settlement<GroupOffer>> {
        let (request_id, rejected) = self
            .ctx
            .retry
            .run("accept_group_offer", || async move {
                let now = self.ctx.now();
                let mut offer = self.ctx.load_group_offer(offer_id).await?;
                let (mut request, mut group) =
                    self.ctx.load_group_listing(offer.group_request_id()).await?;
                {
                    let listing = GroupListing::new(&request, &group)?;
                    NegotiationEngine::accept(&listing, &mut offer, actor, now)?;
                }
                request.complete(offer_id, now)?;
                group.close_deal(now)?;

                let rivals = self
                    .ctx
                    .repos
                    .group_offers
                    .find_by_group_request(&request.id())
                    .await?;
                let request_id = request.id();
                let mut batch = WriteBatch::new();
                batch.update_group_offer(offer);
                batch.update_group_request(request);
                batch.update_group(group);
                let mut rejected = Vec::new();
                for mut rival in rivals.into_iter().filter(|o| o.id() != offer_id) {
                    if NegotiationEngine::reject_on_cascade(&mut rival, OUTBID_MESSAGE, now)? {
                        rejected.push(BidRef::from(rival.id()));
                        batch.update_group_offer(rival);
                    }
                }
                self.ctx.repos.unit_of_work.commit(batch).await?;
                Ok((request_id, rejected))
            })
            .await?;

        let accepted = self.ctx.load_group_offer(offer_id).await?;
        info!(
            group_offer_id = %offer_id,
            group_request_id = %request_id,
            rejected = rejected.len(),
            "group offer accepted, deal closed"
        );
        self.ctx
            .publish(ListingSettled {
                metadata: EventMetadata::at(accepted.updated_at()),
                listing: request_id.into(),
                accepted: offer_id.into(),
                rejected: rejected.clone(),
            })
            .await;
        Ok(Settlement { accepted, rejected })
    }
}
