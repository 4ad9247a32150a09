//! # Repository Traits
//!
//! Port definitions for persistence abstraction.
//!
//! One repository per document collection, plus a [`UnitOfWork`] that
//! commits a [`WriteBatch`] touching several collections at once.
//!
//! # Versioning
//!
//! Every document carries a version starting at 1. `update` is a
//! compare-and-set: it succeeds only when the stored version equals the
//! version of the document passed in, and stores the document with the
//! version incremented. A stale write fails with
//! [`RepositoryError::VersionConflict`] and changes nothing.
//!
//! # Available Repositories
//!
//! - [`RequestRepository`]: Vendor requests
//! - [`OfferRepository`]: Offers on requests
//! - [`GroupRepository`]: Buying groups
//! - [`GroupRequestRepository`]: Group requests (one per group)
//! - [`GroupOfferRepository`]: Offers on group requests
//!
//! # Examples
//!
//! ```ignore
//! use procurement_engine::infrastructure::persistence::traits::OfferRepository;
//!
//! async fn count_bids(repo: &impl OfferRepository, request_id: RequestId) {
//!     let count = repo.count_by_request(&request_id).await.unwrap();
//!     println!("{count} offers received");
//! }
//! ```

use crate::domain::entities::group::Group;
use crate::domain::entities::group_offer::GroupOffer;
use crate::domain::entities::group_request::GroupRequest;
use crate::domain::entities::offer::Offer;
use crate::domain::entities::request::Request;
use crate::domain::value_objects::{
    GroupId, GroupOfferId, GroupRequestId, GroupStatus, OfferId, OfferStatus, RequestId, UserId,
};
use crate::infrastructure::persistence::query::{GroupRequestQuery, RequestQuery};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// A unique constraint would be violated.
    #[error("Duplicate entity: {entity_type} {id} already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier or the violated key.
        id: String,
    },

    /// Optimistic locking conflict.
    #[error("Version conflict: {entity_type} with id {id} has been modified")]
    VersionConflict {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Backend unreachable.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, id: impl ToString) -> Self {
        Self::Duplicate {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates a version conflict error.
    #[must_use]
    pub fn version_conflict(
        entity_type: &'static str,
        id: impl ToString,
        expected: u64,
        actual: u64,
    ) -> Self {
        Self::VersionConflict {
            entity_type,
            id: id.to_string(),
            expected,
            actual,
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a duplicate error.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Returns true if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Collection names used in errors.
pub mod collection {
    /// Requests.
    pub const REQUEST: &str = "Request";
    /// Offers.
    pub const OFFER: &str = "Offer";
    /// Groups.
    pub const GROUP: &str = "Group";
    /// Group requests.
    pub const GROUP_REQUEST: &str = "GroupRequest";
    /// Group offers.
    pub const GROUP_OFFER: &str = "GroupOffer";
}

/// Repository for vendor requests.
#[async_trait]
pub trait RequestRepository: Send + Sync + fmt::Debug {
    /// Stores a new request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the id is taken.
    async fn insert(&self, request: &Request) -> RepositoryResult<()>;

    /// Gets a request by ID.
    ///
    /// Returns `None` if the request does not exist.
    async fn get(&self, id: &RequestId) -> RepositoryResult<Option<Request>>;

    /// Finds requests matching `query`, newest first, windowed.
    async fn find(&self, query: &RequestQuery) -> RepositoryResult<Vec<Request>>;

    /// Counts requests matching `query`, ignoring its window.
    async fn count(&self, query: &RequestQuery) -> RepositoryResult<u64>;

    /// Replaces a request if its version is current.
    ///
    /// Returns the stored copy carrying the new version.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the request is gone
    /// - `RepositoryError::VersionConflict` if it changed since it was read
    async fn update(&self, request: &Request) -> RepositoryResult<Request>;

    /// Deletes a request by ID.
    ///
    /// Returns `Ok(true)` if the request was deleted, `Ok(false)` if it didn't exist.
    async fn delete(&self, id: &RequestId) -> RepositoryResult<bool>;
}

/// Repository for offers on requests.
///
/// A supplier holds at most one offer per request whose status is not
/// rejected; `insert` enforces this.
#[async_trait]
pub trait OfferRepository: Send + Sync + fmt::Debug {
    /// Stores a new offer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the id is taken or the
    /// supplier already holds a live offer on the request.
    async fn insert(&self, offer: &Offer) -> RepositoryResult<()>;

    /// Gets an offer by ID.
    async fn get(&self, id: &OfferId) -> RepositoryResult<Option<Offer>>;

    /// Finds every offer on a request, oldest first.
    async fn find_by_request(&self, request_id: &RequestId) -> RepositoryResult<Vec<Offer>>;

    /// Finds a supplier's offers, optionally in one status, newest first.
    async fn find_by_supplier(
        &self,
        supplier_id: &UserId,
        status: Option<OfferStatus>,
    ) -> RepositoryResult<Vec<Offer>>;

    /// Counts offers on a request.
    async fn count_by_request(&self, request_id: &RequestId) -> RepositoryResult<u64>;

    /// Replaces an offer if its version is current.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the offer is gone
    /// - `RepositoryError::VersionConflict` if it changed since it was read
    async fn update(&self, offer: &Offer) -> RepositoryResult<Offer>;

    /// Deletes an offer by ID.
    async fn delete(&self, id: &OfferId) -> RepositoryResult<bool>;
}

/// Repository for buying groups.
#[async_trait]
pub trait GroupRepository: Send + Sync + fmt::Debug {
    /// Stores a new group.
    async fn insert(&self, group: &Group) -> RepositoryResult<()>;

    /// Gets a group by ID.
    async fn get(&self, id: &GroupId) -> RepositoryResult<Option<Group>>;

    /// Finds groups `user` belongs to, newest first.
    async fn find_by_member(&self, user: &UserId) -> RepositoryResult<Vec<Group>>;

    /// Finds groups in `status`, newest first.
    async fn find_by_status(&self, status: GroupStatus) -> RepositoryResult<Vec<Group>>;

    /// Replaces a group if its version is current.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the group is gone
    /// - `RepositoryError::VersionConflict` if it changed since it was read
    async fn update(&self, group: &Group) -> RepositoryResult<Group>;

    /// Deletes a group if its version is current.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the group is gone
    /// - `RepositoryError::VersionConflict` if it changed since it was read
    async fn delete(&self, group: &Group) -> RepositoryResult<()>;
}

/// Repository for group requests.
///
/// A group has at most one group request; `insert` enforces this.
#[async_trait]
pub trait GroupRequestRepository: Send + Sync + fmt::Debug {
    /// Stores a new group request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the group already has one.
    async fn insert(&self, request: &GroupRequest) -> RepositoryResult<()>;

    /// Gets a group request by ID.
    async fn get(&self, id: &GroupRequestId) -> RepositoryResult<Option<GroupRequest>>;

    /// Gets the group request opened for `group_id`.
    async fn get_by_group(&self, group_id: &GroupId) -> RepositoryResult<Option<GroupRequest>>;

    /// Finds group requests matching `query`, newest first, windowed.
    async fn find(&self, query: &GroupRequestQuery) -> RepositoryResult<Vec<GroupRequest>>;

    /// Counts group requests matching `query`, ignoring its window.
    async fn count(&self, query: &GroupRequestQuery) -> RepositoryResult<u64>;

    /// Replaces a group request if its version is current.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the group request is gone
    /// - `RepositoryError::VersionConflict` if it changed since it was read
    async fn update(&self, request: &GroupRequest) -> RepositoryResult<GroupRequest>;
}

/// Repository for offers on group requests.
///
/// A supplier holds at most one non-rejected offer per group request.
#[async_trait]
pub trait GroupOfferRepository: Send + Sync + fmt::Debug {
    /// Stores a new group offer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the id is taken or the
    /// supplier already holds a live offer on the group request.
    async fn insert(&self, offer: &GroupOffer) -> RepositoryResult<()>;

    /// Gets a group offer by ID.
    async fn get(&self, id: &GroupOfferId) -> RepositoryResult<Option<GroupOffer>>;

    /// Finds every offer on a group request, oldest first.
    async fn find_by_group_request(
        &self,
        group_request_id: &GroupRequestId,
    ) -> RepositoryResult<Vec<GroupOffer>>;

    /// Finds a supplier's group offers, newest first.
    async fn find_by_supplier(&self, supplier_id: &UserId) -> RepositoryResult<Vec<GroupOffer>>;

    /// Counts offers on a group request.
    async fn count_by_group_request(
        &self,
        group_request_id: &GroupRequestId,
    ) -> RepositoryResult<u64>;

    /// Replaces a group offer if its version is current.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the group offer is gone
    /// - `RepositoryError::VersionConflict` if it changed since it was read
    async fn update(&self, offer: &GroupOffer) -> RepositoryResult<GroupOffer>;
}

/// One write inside a [`WriteBatch`].
///
/// Updates, deletes and touches carry the document as it was read; its
/// version is the compare-and-set guard.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Bump a request's version without changing it.
    ///
    /// Ties a child insert to the listing state it was checked against.
    TouchRequest(Request),
    /// Compare-and-set a request.
    UpdateRequest(Request),
    /// Delete a request, guarded by its version.
    DeleteRequest(Request),
    /// Insert an offer, enforcing one live offer per supplier and request.
    InsertOffer(Offer),
    /// Compare-and-set an offer.
    UpdateOffer(Offer),
    /// Delete an offer, guarded by its version.
    DeleteOffer(Offer),
    /// Compare-and-set a group.
    UpdateGroup(Group),
    /// Bump a group request's version without changing it.
    TouchGroupRequest(GroupRequest),
    /// Insert a group request, enforcing one per group.
    InsertGroupRequest(GroupRequest),
    /// Compare-and-set a group request.
    UpdateGroupRequest(GroupRequest),
    /// Insert a group offer, enforcing one live offer per supplier.
    InsertGroupOffer(GroupOffer),
    /// Compare-and-set a group offer.
    UpdateGroupOffer(GroupOffer),
}

impl WriteOp {
    /// Collection the op writes to.
    #[must_use]
    pub fn collection(&self) -> &'static str {
        match self {
            Self::TouchRequest(_) | Self::UpdateRequest(_) | Self::DeleteRequest(_) => {
                collection::REQUEST
            }
            Self::InsertOffer(_) | Self::UpdateOffer(_) | Self::DeleteOffer(_) => {
                collection::OFFER
            }
            Self::UpdateGroup(_) => collection::GROUP,
            Self::TouchGroupRequest(_)
            | Self::InsertGroupRequest(_)
            | Self::UpdateGroupRequest(_) => collection::GROUP_REQUEST,
            Self::InsertGroupOffer(_) | Self::UpdateGroupOffer(_) => collection::GROUP_OFFER,
        }
    }

    /// Version the op expects to find stored, or `None` for inserts.
    #[must_use]
    pub fn expected_version(&self) -> Option<u64> {
        match self {
            Self::TouchRequest(r) | Self::UpdateRequest(r) | Self::DeleteRequest(r) => {
                Some(r.version())
            }
            Self::UpdateOffer(o) | Self::DeleteOffer(o) => Some(o.version()),
            Self::UpdateGroup(g) => Some(g.version()),
            Self::TouchGroupRequest(r) | Self::UpdateGroupRequest(r) => Some(r.version()),
            Self::UpdateGroupOffer(o) => Some(o.version()),
            Self::InsertOffer(_) | Self::InsertGroupRequest(_) | Self::InsertGroupOffer(_) => None,
        }
    }
}

/// Writes committed all together or not at all.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an op.
    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Appends a request version bump.
    pub fn touch_request(&mut self, request: Request) -> &mut Self {
        self.push(WriteOp::TouchRequest(request))
    }

    /// Appends a request update.
    pub fn update_request(&mut self, request: Request) -> &mut Self {
        self.push(WriteOp::UpdateRequest(request))
    }

    /// Appends a request delete.
    pub fn delete_request(&mut self, request: Request) -> &mut Self {
        self.push(WriteOp::DeleteRequest(request))
    }

    /// Appends an offer insert.
    pub fn insert_offer(&mut self, offer: Offer) -> &mut Self {
        self.push(WriteOp::InsertOffer(offer))
    }

    /// Appends an offer update.
    pub fn update_offer(&mut self, offer: Offer) -> &mut Self {
        self.push(WriteOp::UpdateOffer(offer))
    }

    /// Appends an offer delete.
    pub fn delete_offer(&mut self, offer: Offer) -> &mut Self {
        self.push(WriteOp::DeleteOffer(offer))
    }

    /// Appends a group update.
    pub fn update_group(&mut self, group: Group) -> &mut Self {
        self.push(WriteOp::UpdateGroup(group))
    }

    /// Appends a group request version bump.
    pub fn touch_group_request(&mut self, request: GroupRequest) -> &mut Self {
        self.push(WriteOp::TouchGroupRequest(request))
    }

    /// Appends a group request insert.
    pub fn insert_group_request(&mut self, request: GroupRequest) -> &mut Self {
        self.push(WriteOp::InsertGroupRequest(request))
    }

    /// Appends a group request update.
    pub fn update_group_request(&mut self, request: GroupRequest) -> &mut Self {
        self.push(WriteOp::UpdateGroupRequest(request))
    }

    /// Appends a group offer insert.
    pub fn insert_group_offer(&mut self, offer: GroupOffer) -> &mut Self {
        self.push(WriteOp::InsertGroupOffer(offer))
    }

    /// Appends a group offer update.
    pub fn update_group_offer(&mut self, offer: GroupOffer) -> &mut Self {
        self.push(WriteOp::UpdateGroupOffer(offer))
    }

    /// Returns the queued ops in order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consumes the batch.
    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Returns the number of queued ops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Atomic multi-document commit.
#[async_trait]
pub trait UnitOfWork: Send + Sync + fmt::Debug {
    /// Commits every op in `batch` or none of them.
    ///
    /// All guards are checked before anything is written. A guarded
    /// document that was removed since it was read counts as changed.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::VersionConflict` if any guarded document changed
    ///   or disappeared since it was read
    /// - `RepositoryError::Duplicate` if an insert breaks a unique constraint
    async fn commit(&self, batch: WriteBatch) -> RepositoryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod repository_error {
        use super::*;

        #[test]
        fn not_found_error() {
            let err = RepositoryError::not_found(collection::REQUEST, "req-123");
            assert!(err.is_not_found());
            assert!(!err.is_duplicate());
            assert!(!err.is_version_conflict());
            assert!(err.to_string().contains("not found"));
            assert!(err.to_string().contains("Request"));
            assert!(err.to_string().contains("req-123"));
        }

        #[test]
        fn duplicate_error() {
            let err = RepositoryError::duplicate(collection::GROUP_REQUEST, "group g-1");
            assert!(err.is_duplicate());
            assert!(err.to_string().contains("GroupRequest"));
        }

        #[test]
        fn version_conflict_error() {
            let err = RepositoryError::version_conflict(collection::OFFER, "o-1", 1, 2);
            assert!(err.is_version_conflict());
            assert!(!err.is_not_found());
            assert!(err.to_string().contains("conflict"));
        }

        #[test]
        fn connection_error() {
            let err = RepositoryError::connection("Connection refused");
            assert!(err.to_string().contains("refused"));
        }
    }

    #[test]
    fn new_batch_is_empty() {
        let batch = WriteBatch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }
}
