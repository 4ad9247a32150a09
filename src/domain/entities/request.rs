//! # Request Aggregate
//!
//! An individual vendor's sourcing request.
//!
//! # State Machine
//!
//! ```text
//! Open → Fulfilled   (an offer was accepted)
//!   ├──→ Expired     (time ran out or the owner closed it)
//!   └──→ Cancelled
//! ```
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::entities::request::RequestBuilder;
//! use procurement_engine::domain::value_objects::{Price, Quantity, RequestStatus, Timestamp, UserId};
//!
//! let now = Timestamp::now();
//! let request = RequestBuilder::new(
//!     UserId::new("vendor-1"),
//!     "Tomatoes",
//!     Quantity::parse("50kg").unwrap(),
//!     Price::new(12).unwrap(),
//!     "Pune",
//!     now.add_days(7),
//! )
//! .build(now)
//! .unwrap();
//!
//! assert_eq!(request.status(), RequestStatus::Open);
//! assert!(request.is_open_at(now));
//! ```

use crate::domain::entities::negotiation::Listing;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    DeliveryPreference, OfferId, Price, Quantity, RequestId, RequestStatus, Timestamp, Urgency,
    UserId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category assigned when the vendor does not pick one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Individual sourcing request.
///
/// # Invariants
///
/// - `accepted_offer_id` is set exactly when `status` is `Fulfilled`
/// - `item` and `location` are never blank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    id: RequestId,
    owner_id: UserId,
    item: String,
    quantity: Quantity,
    desired_price: Price,
    location: String,
    description: String,
    category: String,
    urgency: Urgency,
    delivery_preference: DeliveryPreference,
    status: RequestStatus,
    accepted_offer_id: Option<OfferId>,
    offers_count: u64,
    expires_at: Timestamp,
    created_at: Timestamp,
    updated_at: Timestamp,
    version: u64,
}

impl Request {
    /// Starts building a request.
    #[must_use]
    pub fn builder(
        owner_id: UserId,
        item: impl Into<String>,
        quantity: Quantity,
        desired_price: Price,
        location: impl Into<String>,
        expires_at: Timestamp,
    ) -> RequestBuilder {
        RequestBuilder::new(owner_id, item, quantity, desired_price, location, expires_at)
    }

    // ========== Accessors ==========

    /// Returns the request ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the owning vendor.
    #[inline]
    #[must_use]
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    /// Returns the requested item.
    #[inline]
    #[must_use]
    pub fn item(&self) -> &str {
        &self.item
    }

    /// Returns the requested quantity.
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    /// Returns the desired per-unit price.
    #[inline]
    #[must_use]
    pub fn desired_price(&self) -> Price {
        self.desired_price
    }

    /// Returns the delivery location.
    #[inline]
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the free-text description.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the category.
    #[inline]
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns the urgency.
    #[inline]
    #[must_use]
    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    /// Returns the delivery preference.
    #[inline]
    #[must_use]
    pub fn delivery_preference(&self) -> DeliveryPreference {
        self.delivery_preference
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// Returns the accepted offer, if any.
    #[inline]
    #[must_use]
    pub fn accepted_offer_id(&self) -> Option<OfferId> {
        self.accepted_offer_id
    }

    /// Returns the number of offers received, as of the last read.
    #[inline]
    #[must_use]
    pub fn offers_count(&self) -> u64 {
        self.offers_count
    }

    /// Returns the expiry instant.
    #[inline]
    #[must_use]
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Returns when the request was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the request was last updated.
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

    /// Returns true if the request accepts offers at `now`.
    #[must_use]
    pub fn is_open_at(&self, now: Timestamp) -> bool {
        self.status == RequestStatus::Open && !self.expires_at.has_passed(now)
    }

    /// Returns true if the request is still marked open but its time is up.
    #[must_use]
    pub fn is_overdue_at(&self, now: Timestamp) -> bool {
        self.status == RequestStatus::Open && self.expires_at.has_passed(now)
    }

    // ========== Mutations ==========

    /// Replaces the derived offer count.
    pub fn set_offers_count(&mut self, count: u64) {
        self.offers_count = count;
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Applies a partial update from the owner.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` if the request is fulfilled
    /// - `DomainError::ValidationError` if a provided text field is blank
    pub fn update(&mut self, changes: RequestChanges, now: Timestamp) -> DomainResult<()> {
        if self.status == RequestStatus::Fulfilled {
            return Err(DomainError::invalid_state("cannot update a fulfilled request"));
        }

        if let Some(item) = changes.item {
            self.item = non_blank("item", item)?;
        }
        if let Some(location) = changes.location {
            self.location = non_blank("location", location)?;
        }
        if let Some(quantity) = changes.quantity {
            self.quantity = quantity;
        }
        if let Some(price) = changes.desired_price {
            self.desired_price = price;
        }
        if let Some(description) = changes.description {
            self.description = description.trim().to_string();
        }
        if let Some(category) = changes.category {
            self.category = non_blank("category", category)?;
        }
        if let Some(urgency) = changes.urgency {
            self.urgency = urgency;
        }
        if let Some(pref) = changes.delivery_preference {
            self.delivery_preference = pref;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Marks the request fulfilled by `offer_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ListingClosed` unless the request is open at `now`.
    pub fn fulfil(&mut self, offer_id: OfferId, now: Timestamp) -> DomainResult<()> {
        if !self.is_open_at(now) {
            return Err(DomainError::ListingClosed(format!(
                "request {} is {}",
                self.id, self.status
            )));
        }
        self.status = RequestStatus::Fulfilled;
        self.accepted_offer_id = Some(offer_id);
        self.updated_at = now;
        Ok(())
    }

    /// Marks an open request expired.
    ///
    /// Expiring an already expired request is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if the request is fulfilled or cancelled.
    pub fn expire(&mut self, now: Timestamp) -> DomainResult<()> {
        match self.status {
            RequestStatus::Open => {
                self.status = RequestStatus::Expired;
                self.updated_at = now;
                Ok(())
            }
            RequestStatus::Expired => Ok(()),
            RequestStatus::Fulfilled | RequestStatus::Cancelled => Err(
                DomainError::invalid_state(format!("request {} is already {}", self.id, self.status)),
            ),
        }
    }
}

impl Listing for Request {
    type Id = RequestId;
    const KIND: &'static str = "request";

    fn listing_id(&self) -> RequestId {
        self.id
    }

    fn owner(&self) -> &UserId {
        &self.owner_id
    }

    fn is_open_at(&self, now: Timestamp) -> bool {
        Request::is_open_at(self, now)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Request({} {} {} @ {} [{}])",
            self.id, self.quantity, self.item, self.desired_price, self.status
        )
    }
}

/// Partial update of a request. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestChanges {
    /// New item.
    pub item: Option<String>,
    /// New quantity.
    pub quantity: Option<Quantity>,
    /// New desired price.
    pub desired_price: Option<Price>,
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

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    owner_id: UserId,
    item: String,
    quantity: Quantity,
    desired_price: Price,
    location: String,
    expires_at: Timestamp,
    description: String,
    category: String,
    urgency: Urgency,
    delivery_preference: DeliveryPreference,
}

impl RequestBuilder {
    /// Creates a builder with the required fields.
    #[must_use]
    pub fn new(
        owner_id: UserId,
        item: impl Into<String>,
        quantity: Quantity,
        desired_price: Price,
        location: impl Into<String>,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            owner_id,
            item: item.into(),
            quantity,
            desired_price,
            location: location.into(),
            expires_at,
            description: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            urgency: Urgency::default(),
            delivery_preference: DeliveryPreference::default(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the urgency.
    #[must_use]
    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Sets the delivery preference.
    #[must_use]
    pub fn delivery_preference(mut self, pref: DeliveryPreference) -> Self {
        self.delivery_preference = pref;
        self
    }

    /// Validates and builds the request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if item, location or category
    /// is blank, or if `expires_at` is not after `now`.
    pub fn build(self, now: Timestamp) -> DomainResult<Request> {
        if self.expires_at.has_passed(now) {
            return Err(DomainError::validation("expiry must be in the future"));
        }
        Ok(Request {
            id: RequestId::new_v4(),
            owner_id: self.owner_id,
            item: non_blank("item", self.item)?,
            quantity: self.quantity,
            desired_price: self.desired_price,
            location: non_blank("location", self.location)?,
            description: self.description.trim().to_string(),
            category: non_blank("category", self.category)?,
            urgency: self.urgency,
            delivery_preference: self.delivery_preference,
            status: RequestStatus::Open,
            accepted_offer_id: None,
            offers_count: 0,
            expires_at: self.expires_at,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }
}

pub(crate) fn non_blank(field: &str, value: String) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
