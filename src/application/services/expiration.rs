//! # Expiration Sweep
//!
//! Expires open requests and active group requests whose time is up, and
//! rejects every bid still in play on them in the same write batch.
//!
//! The cascade helpers here are shared with `close_request`, which is an
//! owner-initiated early expiration.

use crate::application::error::ApplicationResult;
use crate::application::services::context::MarketplaceContext;
use crate::domain::entities::group_request::GroupRequest;
use crate::domain::entities::negotiation::EXPIRED_MESSAGE;
use crate::domain::entities::request::Request;
use crate::domain::events::{EventMetadata, ListingExpired};
use crate::domain::services::negotiation::NegotiationEngine;
use crate::domain::value_objects::{GroupRequestId, RequestId, Timestamp};
use crate::infrastructure::persistence::{GroupRequestQuery, RequestQuery, WriteBatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Expires `request` and rejects its live offers with `reason`, atomically.
///
/// `request` must be freshly loaded; its version guards the batch.
/// Returns the number of offers rejected.
pub(crate) async fn expire_request_cascade(
    ctx: &MarketplaceContext,
    mut request: Request,
    reason: &str,
    now: Timestamp,
) -> ApplicationResult<usize> {
    request.expire(now)?;
    let offers = ctx.repos.offers.find_by_request(&request.id()).await?;

    let mut batch = WriteBatch::new();
    batch.update_request(request);
    let mut rejected = 0;
    for mut offer in offers {
        if NegotiationEngine::reject_on_cascade(&mut offer, reason, now)? {
            batch.update_offer(offer);
            rejected += 1;
        }
    }
    ctx.repos.unit_of_work.commit(batch).await?;
    Ok(rejected)
}

/// Expires `request` and rejects its live group offers, atomically.
pub(crate) async fn expire_group_request_cascade(
    ctx: &MarketplaceContext,
    mut request: GroupRequest,
    now: Timestamp,
) -> ApplicationResult<usize> {
    request.expire(now)?;
    let offers = ctx
        .repos
        .group_offers
        .find_by_group_request(&request.id())
        .await?;

    let mut batch = WriteBatch::new();
    batch.update_group_request(request);
    let mut rejected = 0;
    for mut offer in offers {
        if NegotiationEngine::reject_on_cascade(&mut offer, EXPIRED_MESSAGE, now)? {
            batch.update_group_offer(offer);
            rejected += 1;
        }
    }
    ctx.repos.unit_of_work.commit(batch).await?;
    Ok(rejected)
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Requests moved to expired.
    pub expired_requests: usize,
    /// Group requests moved to expired.
    pub expired_group_requests: usize,
    /// Bids rejected by the cascade.
    pub rejected_bids: usize,
    /// Listings that could not be expired this round.
    pub failures: usize,
}

impl SweepReport {
    /// Returns true if the sweep changed nothing.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.expired_requests == 0 && self.expired_group_requests == 0 && self.failures == 0
    }
}

/// Background expiration of overdue listings.
#[derive(Debug, Clone)]
pub struct ExpirationSweeper {
    ctx: Arc<MarketplaceContext>,
}

impl ExpirationSweeper {
    /// Creates a sweeper.
    #[must_use]
    pub fn new(ctx: Arc<MarketplaceContext>) -> Self {
        Self { ctx }
    }

    /// Expires every overdue listing once.
    ///
    /// A listing that fails to expire is logged and counted; it is picked up
    /// again by the next sweep.
    ///
    /// # Errors
    ///
    /// Returns an error only if the overdue listings cannot be queried.
    pub async fn sweep(&self) -> ApplicationResult<SweepReport> {
        let now = self.ctx.now();
        let mut report = SweepReport::default();

        let overdue = self
            .ctx
            .repos
            .requests
            .find(&RequestQuery::overdue_at(now))
            .await?;
        for request in overdue {
            let id = request.id();
            match self.expire_request(id, now).await {
                Ok(Some(rejected)) => {
                    report.expired_requests += 1;
                    report.rejected_bids += rejected;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(request_id = %id, error = %err, "failed to expire request");
                    report.failures += 1;
                }
            }
        }

        let overdue = self
            .ctx
            .repos
            .group_requests
            .find(&GroupRequestQuery::overdue_at(now))
            .await?;
        for request in overdue {
            let id = request.id();
            match self.expire_group_request(id, now).await {
                Ok(Some(rejected)) => {
                    report.expired_group_requests += 1;
                    report.rejected_bids += rejected;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(group_request_id = %id, error = %err, "failed to expire group request");
                    report.failures += 1;
                }
            }
        }

        if report.is_idle() {
            debug!("expiration sweep found nothing to do");
        } else {
            info!(
                expired_requests = report.expired_requests,
                expired_group_requests = report.expired_group_requests,
                rejected_bids = report.rejected_bids,
                failures = report.failures,
                "expiration sweep finished"
            );
        }
        Ok(report)
    }

    /// Expires one request, re-reading it on every attempt.
    ///
    /// Returns `None` if it settled or expired in the meantime.
    async fn expire_request(&self, id: RequestId, now: Timestamp) -> ApplicationResult<Option<usize>> {
        let rejected = self
            .ctx
            .retry
            .run("expire_request", || async move {
                let request = self.ctx.load_request(id).await?;
                if !request.is_overdue_at(now) {
                    return Ok(None);
                }
                expire_request_cascade(&self.ctx, request, EXPIRED_MESSAGE, now)
                    .await
                    .map(Some)
            })
            .await?;

        if let Some(rejected_bids) = rejected {
            info!(request_id = %id, rejected_bids, "request expired");
            self.ctx
                .publish(ListingExpired {
                    metadata: EventMetadata::at(now),
                    listing: id.into(),
                    rejected_bids,
                })
                .await;
        }
        Ok(rejected)
    }

    async fn expire_group_request(
        &self,
        id: GroupRequestId,
        now: Timestamp,
    ) -> ApplicationResult<Option<usize>> {
        let rejected = self
            .ctx
            .retry
            .run("expire_group_request", || async move {
                let request = self.ctx.load_group_request(id).await?;
                if !request.is_overdue_at(now) {
                    return Ok(None);
                }
                expire_group_request_cascade(&self.ctx, request, now)
                    .await
                    .map(Some)
            })
            .await?;

        if let Some(rejected_bids) = rejected {
            info!(group_request_id = %id, rejected_bids, "group request expired");
            self.ctx
                .publish(ListingExpired {
                    metadata: EventMetadata::at(now),
                    listing: id.into(),
                    rejected_bids,
                })
                .await;
        }
        Ok(rejected)
    }

    /// Runs [`sweep`](Self::sweep) every `every` until `shutdown` flips to
    /// true or its sender is dropped.
    #[must_use]
    pub fn spawn(self, every: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(interval_secs = every.as_secs(), "expiration sweeper started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = self.sweep().await {
                            warn!(error = %err, "expiration sweep failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("expiration sweeper stopped");
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::services::clock::ManualClock;
    use crate::application::services::context::Repositories;
    use crate::config::MarketplaceConfig;
    use crate::domain::entities::group::GroupBuilder;
    use crate::domain::entities::group_offer::GroupOffer;
    use crate::domain::entities::offer::{Offer, OfferTerms};
    use crate::domain::entities::request::RequestBuilder;
    use crate::domain::services::quantity_aggregation::QuantityAggregator;
    use crate::domain::value_objects::{
        GroupRequestStatus, OfferStatus, Price, Quantity, RequestStatus, UserId,
    };
    use crate::infrastructure::persistence::{
        GroupOfferRepository, GroupRepository, GroupRequestRepository, InMemoryStore,
        OfferRepository, RequestRepository,
    };

    fn start() -> Timestamp {
        Timestamp::from_secs(1_704_067_200).unwrap()
    }

    fn setup() -> (InMemoryStore, Arc<ManualClock>, ExpirationSweeper) {
        let store = InMemoryStore::new();
        let clock = Arc::new(ManualClock::new(start()));
        let ctx = MarketplaceContext::new(
            Repositories::in_memory(store.clone()),
            MarketplaceConfig::default(),
        )
        .with_clock(clock.clone());
        (store, clock, ExpirationSweeper::new(Arc::new(ctx)))
    }

    async fn seed_request(store: &InMemoryStore, days: i64) -> Request {
        let request = RequestBuilder::new(
            UserId::new("vendor-1"),
            "Onions",
            Quantity::parse("20kg").unwrap(),
            Price::new(30).unwrap(),
            "Pune",
            start().add_days(days),
        )
        .build(start())
        .unwrap();
        RequestRepository::insert(store, &request).await.unwrap();
        request
    }

    async fn seed_offer(store: &InMemoryStore, request: &Request, supplier: &str) -> Offer {
        let offer = Offer::new(
            request.id(),
            UserId::new(supplier),
            OfferTerms::new(Price::new(28).unwrap(), "2 days"),
            start(),
        )
        .unwrap();
        OfferRepository::insert(store, &offer).await.unwrap();
        offer
    }

    #[tokio::test]
    async fn sweep_expires_overdue_request_and_rejects_offers() {
        let (store, clock, sweeper) = setup();
        let request = seed_request(&store, 1).await;
        let fresh = seed_request(&store, 5).await;
        let first = seed_offer(&store, &request, "supplier-1").await;
        let second = seed_offer(&store, &request, "supplier-2").await;

        clock.advance_days(2);
        let report = sweeper.sweep().await.unwrap();

        assert_eq!(report.expired_requests, 1);
        assert_eq!(report.rejected_bids, 2);
        assert_eq!(report.failures, 0);

        let stored = RequestRepository::get(&store, &request.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), RequestStatus::Expired);
        let untouched = RequestRepository::get(&store, &fresh.id()).await.unwrap().unwrap();
        assert_eq!(untouched.status(), RequestStatus::Open);

        for id in [first.id(), second.id()] {
            let offer = OfferRepository::get(&store, &id).await.unwrap().unwrap();
            assert_eq!(offer.status(), OfferStatus::Rejected);
        }
    }

    #[tokio::test]
    async fn second_sweep_is_idle() {
        let (store, clock, sweeper) = setup();
        seed_request(&store, 1).await;
        clock.advance_days(1);

        assert_eq!(sweeper.sweep().await.unwrap().expired_requests, 1);
        assert!(sweeper.sweep().await.unwrap().is_idle());
    }

    #[tokio::test]
    async fn sweep_expires_group_requests_and_logs_history() {
        let (store, clock, sweeper) = setup();
        let mut group = GroupBuilder::new(
            UserId::new("leader"),
            "Rice buyers",
            "Rice",
            Quantity::parse("50kg").unwrap(),
            Price::new(40).unwrap(),
            "Delhi",
            start().add_days(7),
        )
        .build(start())
        .unwrap();
        let request = GroupRequest::open_for(&group, start().add_days(3), start()).unwrap();
        group.open_request(&UserId::new("leader"), start()).unwrap();
        GroupRepository::insert(&store, &group).await.unwrap();
        GroupRequestRepository::insert(&store, &request).await.unwrap();

        let offer = GroupOffer::new(
            request.id(),
            UserId::new("supplier-1"),
            OfferTerms::new(Price::new(38).unwrap(), "3 days"),
            QuantityAggregator::quantity_factor(request.quantity()),
            start(),
        )
        .unwrap();
        GroupOfferRepository::insert(&store, &offer).await.unwrap();

        clock.advance_days(3);
        let report = sweeper.sweep().await.unwrap();
        assert_eq!(report.expired_group_requests, 1);
        assert_eq!(report.rejected_bids, 1);

        let stored = GroupRequestRepository::get(&store, &request.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), GroupRequestStatus::Expired);
        let offer = GroupOfferRepository::get(&store, &offer.id()).await.unwrap().unwrap();
        assert_eq!(offer.status(), OfferStatus::Rejected);
        let last = offer.negotiation_history().last().unwrap();
        assert_eq!(last.message.as_deref(), Some(EXPIRED_MESSAGE));
    }

    #[tokio::test]
    async fn spawned_sweeper_stops_on_shutdown() {
        let (store, clock, sweeper) = setup();
        let request = seed_request(&store, 1).await;
        clock.advance_days(2);

        let (tx, rx) = watch::channel(false);
        let handle = sweeper.spawn(Duration::from_millis(10), rx);
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        let stored = RequestRepository::get(&store, &request.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), RequestStatus::Expired);
    }
}
