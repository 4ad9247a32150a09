//! # Service Context
//!
//! Shared dependencies of every application service: repositories, the
//! unit of work, the clock, the event sink, configuration and the conflict
//! retry policy.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::clock::{Clock, SystemClock};
use crate::application::services::event_publisher::{EventPublisher, LoggingPublisher};
use crate::application::services::retry::RetryPolicy;
use crate::config::MarketplaceConfig;
use crate::domain::entities::group::Group;
use crate::domain::entities::group_offer::GroupOffer;
use crate::domain::entities::group_request::GroupRequest;
use crate::domain::entities::offer::Offer;
use crate::domain::entities::request::Request;
use crate::domain::events::{DomainEvent, MarketplaceEvent};
use crate::domain::value_objects::{
    GroupId, GroupOfferId, GroupRequestId, OfferId, RequestId, Timestamp,
};
use crate::infrastructure::persistence::traits::collection;
use crate::infrastructure::persistence::{
    GroupOfferRepository, GroupRepository, GroupRequestRepository, InMemoryStore,
    OfferRepository, RequestRepository, UnitOfWork,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Every persistence port the services use.
#[derive(Debug, Clone)]
pub struct Repositories {
    /// Requests.
    pub requests: Arc<dyn RequestRepository>,
    /// Offers on requests.
    pub offers: Arc<dyn OfferRepository>,
    /// Groups.
    pub groups: Arc<dyn GroupRepository>,
    /// Group requests.
    pub group_requests: Arc<dyn GroupRequestRepository>,
    /// Offers on group requests.
    pub group_offers: Arc<dyn GroupOfferRepository>,
    /// Atomic batches.
    pub unit_of_work: Arc<dyn UnitOfWork>,
}

impl Repositories {
    /// Uses one store for every port.
    #[must_use]
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: RequestRepository
            + OfferRepository
            + GroupRepository
            + GroupRequestRepository
            + GroupOfferRepository
            + UnitOfWork
            + 'static,
    {
        Self {
            requests: store.clone(),
            offers: store.clone(),
            groups: store.clone(),
            group_requests: store.clone(),
            group_offers: store.clone(),
            unit_of_work: store,
        }
    }

    /// Backs every port with `store`.
    #[must_use]
    pub fn in_memory(store: InMemoryStore) -> Self {
        Self::from_store(Arc::new(store))
    }
}

/// Dependencies shared by the services.
#[derive(Debug, Clone)]
pub struct MarketplaceContext {
    pub(crate) repos: Repositories,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) events: Arc<dyn EventPublisher>,
    pub(crate) config: MarketplaceConfig,
    pub(crate) retry: RetryPolicy,
}

impl MarketplaceContext {
    /// Creates a context with the system clock and a logging publisher.
    #[must_use]
    pub fn new(repos: Repositories, config: MarketplaceConfig) -> Self {
        let retry = RetryPolicy::new(config.max_conflict_retries, Duration::from_millis(5));
        Self {
            repos,
            clock: Arc::new(SystemClock),
            events: Arc::new(LoggingPublisher),
            config,
            retry,
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the event publisher.
    #[must_use]
    pub fn with_publisher(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = events;
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // ========== Accessors ==========

    /// Returns the repositories.
    #[inline]
    #[must_use]
    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    /// Returns the current time.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ========== Loading ==========

    pub(crate) async fn load_request(&self, id: RequestId) -> ApplicationResult<Request> {
        self.repos
            .requests
            .get(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(collection::REQUEST, id))
    }

    pub(crate) async fn load_offer(&self, id: OfferId) -> ApplicationResult<Offer> {
        self.repos
            .offers
            .get(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(collection::OFFER, id))
    }

    pub(crate) async fn load_group(&self, id: GroupId) -> ApplicationResult<Group> {
        self.repos
            .groups
            .get(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(collection::GROUP, id))
    }

    pub(crate) async fn load_group_request(
        &self,
        id: GroupRequestId,
    ) -> ApplicationResult<GroupRequest> {
        self.repos
            .group_requests
            .get(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(collection::GROUP_REQUEST, id))
    }

    pub(crate) async fn load_group_offer(&self, id: GroupOfferId) -> ApplicationResult<GroupOffer> {
        self.repos
            .group_offers
            .get(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(collection::GROUP_OFFER, id))
    }

    /// Loads a group request with the group that owns it.
    pub(crate) async fn load_group_listing(
        &self,
        id: GroupRequestId,
    ) -> ApplicationResult<(GroupRequest, Group)> {
        let request = self.load_group_request(id).await?;
        let group = self.load_group(request.group_id()).await?;
        Ok((request, group))
    }

    // ========== Derived fields ==========

    /// Fills in the offer count from the stored offers.
    pub(crate) async fn with_offer_count(&self, mut request: Request) -> ApplicationResult<Request> {
        let count = self.repos.offers.count_by_request(&request.id()).await?;
        request.set_offers_count(count);
        Ok(request)
    }

    /// Fills in the offer count from the stored group offers.
    pub(crate) async fn with_group_offer_count(
        &self,
        mut request: GroupRequest,
    ) -> ApplicationResult<GroupRequest> {
        let count = self
            .repos
            .group_offers
            .count_by_group_request(&request.id())
            .await?;
        request.set_offers_count(count);
        Ok(request)
    }

    // ========== Events ==========

    /// Publishes an event for a committed change.
    pub(crate) async fn publish(&self, event: impl Into<MarketplaceEvent>) {
        let event = event.into();
        let name = event.event_name();
        let subject = event.subject();
        if let Err(err) = self.events.publish(event).await {
            warn!(event = name, subject = %subject, error = %err, "failed to publish event");
        }
    }
}
