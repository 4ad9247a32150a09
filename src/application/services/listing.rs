//! # Listing Service
//!
//! Request lifecycle for vendors: create, read, update, delete and early
//! close, plus the public listing queries for requests and group requests.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::context::MarketplaceContext;
use crate::application::services::expiration::expire_request_cascade;
use crate::application::services::pagination::{Page, PageParams};
use crate::domain::entities::group_request::GroupRequest;
use crate::domain::entities::negotiation::CLOSED_MESSAGE;
use crate::domain::entities::request::{Request, RequestBuilder, RequestChanges};
use crate::domain::events::{EventMetadata, RequestClosed, RequestCreated, RequestDeleted};
use crate::domain::value_objects::{
    Actor, DeliveryPreference, Price, Quantity, RequestId, RequestStatus, Urgency,
};
use crate::infrastructure::persistence::{
    GroupRequestQuery, ListingFilter, RequestQuery, WriteBatch,
};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Input for [`ListingService::create_request`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    /// What is needed.
    pub item: String,
    /// Quantity string such as `50kg`.
    pub quantity: String,
    /// Target per-unit price.
    pub desired_price: Decimal,
    /// Delivery location.
    pub location: String,
    /// Free text.
    #[serde(default)]
    pub description: Option<String>,
    /// Category; defaults to `general`.
    #[serde(default)]
    pub category: Option<String>,
    /// Urgency; defaults to medium.
    #[serde(default)]
    pub urgency: Option<Urgency>,
    /// Delivery preference.
    #[serde(default)]
    pub delivery_preference: Option<DeliveryPreference>,
}

impl NewRequest {
    /// Creates input with the required fields.
    #[must_use]
    pub fn new(
        item: impl Into<String>,
        quantity: impl Into<String>,
        desired_price: impl Into<Decimal>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            item: item.into(),
            quantity: quantity.into(),
            desired_price: desired_price.into(),
            location: location.into(),
            ..Self::default()
        }
    }
}

/// Partial update for [`ListingService::update_request`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestUpdate {
    /// New item.
    pub item: Option<String>,
    /// New quantity string.
    pub quantity: Option<String>,
    /// New desired price.
    pub desired_price: Option<Decimal>,
    /// New location.
    pub location: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New urgency.
    pub urgency: Option<Urgency>,
    /// New delivery preference.
    pub delivery_preference: Option<DeliveryPreference>,
}

impl RequestUpdate {
    /// Parses the numeric fields.
    fn into_changes(self) -> ApplicationResult<RequestChanges> {
        let quantity = self.quantity.as_deref().map(Quantity::parse).transpose()?;
        let desired_price = self.desired_price.map(Price::new).transpose()?;
        Ok(RequestChanges {
            item: self.item,
            quantity,
            desired_price,
            location: self.location,
            description: self.description,
            category: self.category,
            urgency: self.urgency,
            delivery_preference: self.delivery_preference,
        })
    }
}

/// A vendor's request counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStats {
    /// All requests.
    pub total: u64,
    /// Still open.
    pub open: u64,
    /// Settled.
    pub fulfilled: u64,
    /// Timed out or closed early.
    pub expired: u64,
    /// Cancelled.
    pub cancelled: u64,
    /// Offers received across every request.
    pub total_offers: u64,
}

/// Request lifecycle and listing queries.
#[derive(Debug, Clone)]
pub struct ListingService {
    ctx: Arc<MarketplaceContext>,
}

impl ListingService {
    /// Creates the service.
    #[must_use]
    pub fn new(ctx: Arc<MarketplaceContext>) -> Self {
        Self { ctx }
    }

    /// Opens a request that expires after the configured lifetime.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor is not a vendor
    /// - `Validation` for a malformed quantity, a non-positive price or blank text
    pub async fn create_request(&self, actor: &Actor, input: NewRequest) -> ApplicationResult<Request> {
        actor.require_vendor()?;
        let now = self.ctx.now();
        let quantity = Quantity::parse(&input.quantity)?;
        let desired_price = Price::new(input.desired_price)?;

        let mut builder = RequestBuilder::new(
            actor.id().clone(),
            input.item,
            quantity,
            desired_price,
            input.location,
            now.add_days(self.ctx.config.request_ttl_days),
        );
        if let Some(description) = input.description {
            builder = builder.description(description);
        }
        if let Some(category) = input.category {
            builder = builder.category(category);
        }
        if let Some(urgency) = input.urgency {
            builder = builder.urgency(urgency);
        }
        if let Some(pref) = input.delivery_preference {
            builder = builder.delivery_preference(pref);
        }
        let request = builder.build(now)?;
        self.ctx.repos.requests.insert(&request).await?;

        info!(request_id = %request.id(), owner = %actor.id(), item = request.item(), "request created");
        self.ctx
            .publish(RequestCreated {
                metadata: EventMetadata::at(now),
                request_id: request.id(),
                owner_id: actor.id().clone(),
                item: request.item().to_string(),
                quantity: request.quantity().clone(),
                desired_price: request.desired_price(),
                expires_at: request.expires_at(),
            })
            .await;
        Ok(request)
    }

    /// Loads a request with its current offer count.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the request does not exist.
    pub async fn get_request(&self, id: RequestId) -> ApplicationResult<Request> {
        let request = self.ctx.load_request(id).await?;
        self.ctx.with_offer_count(request).await
    }

    /// Lists open, unexpired requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the store cannot be read.
    pub async fn list_open_requests(
        &self,
        actor: &Actor,
        filter: ListingFilter,
        page: PageParams,
    ) -> ApplicationResult<Page<Request>> {
        let page = page.resolve(self.ctx.config.default_page_size, self.ctx.config.max_page_size);
        let query = RequestQuery::open_at(self.ctx.now()).with_filter(filter);

        let total = self.ctx.repos.requests.count(&query).await?;
        let found = self.ctx.repos.requests.find(&query.paged(page.window())).await?;
        let items = try_join_all(found.into_iter().map(|r| self.ctx.with_offer_count(r))).await?;

        debug!(actor = %actor.id(), page = page.page, total, "listed open requests");
        Ok(Page::new(items, page, total))
    }

    /// Lists the actor's requests, optionally in one status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` if the actor is not a vendor.
    pub async fn list_my_requests(
        &self,
        actor: &Actor,
        status: Option<RequestStatus>,
    ) -> ApplicationResult<Vec<Request>> {
        actor.require_vendor()?;
        let query = RequestQuery::owned_by(actor.id().clone()).with_status(status);
        let found = self.ctx.repos.requests.find(&query).await?;
        try_join_all(found.into_iter().map(|r| self.ctx.with_offer_count(r))).await
    }

    /// Counts the actor's requests per status.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` if the actor is not a vendor.
    pub async fn request_stats(&self, actor: &Actor) -> ApplicationResult<RequestStats> {
        let requests = self.list_my_requests(actor, None).await?;
        let mut stats = RequestStats::default();
        for request in &requests {
            stats.total += 1;
            stats.total_offers += request.offers_count();
            match request.status() {
                RequestStatus::Open => stats.open += 1,
                RequestStatus::Fulfilled => stats.fulfilled += 1,
                RequestStatus::Expired => stats.expired += 1,
                RequestStatus::Cancelled => stats.cancelled += 1,
            }
        }
        Ok(stats)
    }

    /// Applies a partial update from the owner.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor owns the request
    /// - `InvalidState` if the request is fulfilled
    /// - `Validation` for malformed fields
    pub async fn update_request(
        &self,
        actor: &Actor,
        id: RequestId,
        update: RequestUpdate,
    ) -> ApplicationResult<Request> {
        let changes = update.into_changes()?;
        let updated = self
            .ctx
            .retry
            .run("update_request", || {
                let changes = changes.clone();
                async move {
                    let mut request = self.ctx.load_request(id).await?;
                    ensure_owner(actor, &request, "update")?;
                    request.update(changes, self.ctx.now())?;
                    Ok(self.ctx.repos.requests.update(&request).await?)
                }
            })
            .await?;

        info!(request_id = %id, "request updated");
        self.ctx.with_offer_count(updated).await
    }

    /// Deletes a request and every offer on it.
    ///
    /// Returns the number of offers deleted.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor owns the request
    /// - `InvalidState` if the request is fulfilled
    pub async fn delete_request(&self, actor: &Actor, id: RequestId) -> ApplicationResult<usize> {
        let deleted = self
            .ctx
            .retry
            .run("delete_request", || async move {
                let request = self.ctx.load_request(id).await?;
                ensure_owner(actor, &request, "delete")?;
                if request.status() == RequestStatus::Fulfilled {
                    return Err(ApplicationError::invalid_state(
                        "cannot delete a fulfilled request",
                    ));
                }

                let offers = self.ctx.repos.offers.find_by_request(&id).await?;
                let deleted = offers.len();
                let mut batch = WriteBatch::new();
                for offer in offers {
                    batch.delete_offer(offer);
                }
                batch.delete_request(request);
                self.ctx.repos.unit_of_work.commit(batch).await?;
                Ok(deleted)
            })
            .await?;

        info!(request_id = %id, deleted_offers = deleted, "request deleted");
        self.ctx
            .publish(RequestDeleted {
                metadata: EventMetadata::at(self.ctx.now()),
                request_id: id,
                deleted_offers: deleted,
            })
            .await;
        Ok(deleted)
    }

    /// Expires a request early and rejects its live offers.
    ///
    /// Returns the number of offers rejected. Closing an already expired
    /// request only re-runs the cascade.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor owns the request
    /// - `InvalidState` if the request is fulfilled or cancelled
    pub async fn close_request(&self, actor: &Actor, id: RequestId) -> ApplicationResult<usize> {
        let now = self.ctx.now();
        let rejected = self
            .ctx
            .retry
            .run("close_request", || async move {
                let request = self.ctx.load_request(id).await?;
                ensure_owner(actor, &request, "close")?;
                if request.status() == RequestStatus::Fulfilled {
                    return Err(ApplicationError::invalid_state(
                        "cannot close a fulfilled request",
                    ));
                }
                expire_request_cascade(&self.ctx, request, CLOSED_MESSAGE, now).await
            })
            .await?;

        info!(request_id = %id, rejected_offers = rejected, "request closed");
        self.ctx
            .publish(RequestClosed {
                metadata: EventMetadata::at(now),
                request_id: id,
                rejected_offers: rejected,
            })
            .await;
        Ok(rejected)
    }

    /// Lists active, unexpired group requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the store cannot be read.
    pub async fn list_active_group_requests(
        &self,
        actor: &Actor,
        filter: ListingFilter,
        page: PageParams,
    ) -> ApplicationResult<Page<GroupRequest>> {
        let page = page.resolve(self.ctx.config.default_page_size, self.ctx.config.max_page_size);
        let query = GroupRequestQuery::active_at(self.ctx.now()).with_filter(filter);

        let total = self.ctx.repos.group_requests.count(&query).await?;
        let found = self
            .ctx
            .repos
            .group_requests
            .find(&query.paged(page.window()))
            .await?;
        let items =
            try_join_all(found.into_iter().map(|r| self.ctx.with_group_offer_count(r))).await?;

        debug!(actor = %actor.id(), page = page.page, total, "listed active group requests");
        Ok(Page::new(items, page, total))
    }
}

fn ensure_owner(actor: &Actor, request: &Request, action: &str) -> ApplicationResult<()> {
    actor.require_vendor()?;
    if !actor.is(request.owner_id()) {
        return Err(ApplicationError::forbidden(format!(
            "only the request owner can {action} it"
        )));
    }
    Ok(())
}
