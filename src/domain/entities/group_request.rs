//! # Group Request Aggregate
//!
//! The single pooled request a group leader opens to suppliers.
//!
//! A group request stores a snapshot of the leader for display, but its
//! ownership is always the *live* group leader. Negotiation therefore works
//! on a [`GroupListing`], which pairs the request with its group.

use crate::domain::entities::group::Group;
use crate::domain::entities::negotiation::Listing;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    GroupId, GroupOfferId, GroupRequestId, GroupRequestStatus, Price, Quantity, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pooled request created from a group's aggregated quantity.
///
/// # Invariants
///
/// - Exactly one group request exists per group
/// - `accepted_offer_id` is set exactly when `status` is `Completed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRequest {
    id: GroupRequestId,
    group_id: GroupId,
    leader_snapshot: UserId,
    item: String,
    quantity: Quantity,
    desired_price: Price,
    location: String,
    status: GroupRequestStatus,
    accepted_offer_id: Option<GroupOfferId>,
    offers_count: u64,
    expires_at: Timestamp,
    created_at: Timestamp,
    updated_at: Timestamp,
    version: u64,
}

impl GroupRequest {
    /// Opens a request for `group`, snapshotting its total quantity.
    ///
    /// The caller is responsible for moving the group to active in the same
    /// write.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if `expires_at` is not after `now`.
    pub fn open_for(group: &Group, expires_at: Timestamp, now: Timestamp) -> DomainResult<Self> {
        if expires_at.has_passed(now) {
            return Err(DomainError::validation("expiry must be in the future"));
        }
        Ok(Self {
            id: GroupRequestId::new_v4(),
            group_id: group.id(),
            leader_snapshot: group.leader_id().clone(),
            item: group.item().to_string(),
            quantity: group.total_quantity().clone(),
            desired_price: group.desired_price(),
            location: group.location().to_string(),
            status: GroupRequestStatus::Active,
            accepted_offer_id: None,
            offers_count: 0,
            expires_at,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    /// Returns the group request ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> GroupRequestId {
        self.id
    }

    /// Returns the owning group.
    #[inline]
    #[must_use]
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Returns the leader at creation time. Display only.
    #[inline]
    #[must_use]
    pub fn leader_snapshot(&self) -> &UserId {
        &self.leader_snapshot
    }

    /// Returns the item.
    #[inline]
    #[must_use]
    pub fn item(&self) -> &str {
        &self.item
    }

    /// Returns the pooled quantity.
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

    /// Returns the location.
    #[inline]
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> GroupRequestStatus {
        self.status
    }

    /// Returns the accepted group offer, if any.
    #[inline]
    #[must_use]
    pub fn accepted_offer_id(&self) -> Option<GroupOfferId> {
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
        self.status == GroupRequestStatus::Active && !self.expires_at.has_passed(now)
    }

    /// Returns true if the request is still active but its time is up.
    #[must_use]
    pub fn is_overdue_at(&self, now: Timestamp) -> bool {
        self.status == GroupRequestStatus::Active && self.expires_at.has_passed(now)
    }

    /// Replaces the derived offer count.
    pub fn set_offers_count(&mut self, count: u64) {
        self.offers_count = count;
    }

    /// Marks the request completed by `offer_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ListingClosed` unless the request is open at `now`.
    pub fn complete(&mut self, offer_id: GroupOfferId, now: Timestamp) -> DomainResult<()> {
        if !self.is_open_at(now) {
            return Err(DomainError::ListingClosed(format!(
                "group request {} is {}",
                self.id, self.status
            )));
        }
        self.status = GroupRequestStatus::Completed;
        self.accepted_offer_id = Some(offer_id);
        self.updated_at = now;
        Ok(())
    }

    /// Marks an active request expired.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if the request is already terminal.
    pub fn expire(&mut self, now: Timestamp) -> DomainResult<()> {
        if self.status != GroupRequestStatus::Active {
            return Err(DomainError::invalid_state(format!(
                "group request {} is already {}",
                self.id, self.status
            )));
        }
        self.status = GroupRequestStatus::Expired;
        self.updated_at = now;
        Ok(())
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl fmt::Display for GroupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GroupRequest({} {} {} @ {} [{}])",
            self.id, self.quantity, self.item, self.desired_price, self.status
        )
    }
}

/// A group request viewed together with its group.
///
/// Ownership is the group's current leader, never the snapshot.
#[derive(Debug, Clone, Copy)]
pub struct GroupListing<'a> {
    request: &'a GroupRequest,
    group: &'a Group,
}

impl<'a> GroupListing<'a> {
    /// Pairs a request with its group.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if the group is not the request's group.
    pub fn new(request: &'a GroupRequest, group: &'a Group) -> DomainResult<Self> {
        if request.group_id() != group.id() {
            return Err(DomainError::invalid_state(format!(
                "group request {} does not belong to group {}",
                request.id(),
                group.id()
            )));
        }
        Ok(Self { request, group })
    }

    /// Returns the request.
    #[must_use]
    pub fn request(&self) -> &'a GroupRequest {
        self.request
    }

    /// Returns the group.
    #[must_use]
    pub fn group(&self) -> &'a Group {
        self.group
    }
}

impl Listing for GroupListing<'_> {
    type Id = GroupRequestId;
    const KIND: &'static str = "group request";

    fn listing_id(&self) -> GroupRequestId {
        self.request.id()
    }

    fn owner(&self) -> &UserId {
        self.group.leader_id()
    }

    fn is_open_at(&self, now: Timestamp) -> bool {
        self.request.is_open_at(now)
    }
}
