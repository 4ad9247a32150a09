//! # In-Memory Store
//!
//! One shared set of tables behind a single lock, so a [`WriteBatch`]
//! touching several collections commits atomically.
//!
//! [`WriteBatch`]: crate::infrastructure::persistence::traits::WriteBatch

use crate::domain::entities::group::Group;
use crate::domain::entities::group_offer::GroupOffer;
use crate::domain::entities::group_request::GroupRequest;
use crate::domain::entities::offer::Offer;
use crate::domain::entities::request::Request;
use crate::domain::value_objects::{
    GroupId, GroupOfferId, GroupRequestId, OfferId, OfferStatus, RequestId, Timestamp,
};
use crate::infrastructure::persistence::traits::{
    RepositoryError, RepositoryResult, WriteOp, collection,
};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A stored document with an optimistic version.
pub(crate) trait Versioned: Clone {
    /// Primary key type.
    type Key: Copy + Eq + Hash + fmt::Display;

    /// Collection name used in errors.
    const COLLECTION: &'static str;

    fn key(&self) -> Self::Key;
    fn version(&self) -> u64;
    fn created_at(&self) -> Timestamp;
    fn set_version(&mut self, version: u64);
}

macro_rules! versioned {
    ($ty:ty, $key:ty, $collection:expr) => {
        impl Versioned for $ty {
            type Key = $key;
            const COLLECTION: &'static str = $collection;

            fn key(&self) -> Self::Key {
                self.id()
            }

            fn version(&self) -> u64 {
                <$ty>::version(self)
            }

            fn created_at(&self) -> Timestamp {
                <$ty>::created_at(self)
            }

            fn set_version(&mut self, version: u64) {
                <$ty>::set_version(self, version);
            }
        }
    };
}

versioned!(Request, RequestId, collection::REQUEST);
versioned!(Offer, OfferId, collection::OFFER);
versioned!(Group, GroupId, collection::GROUP);
versioned!(GroupRequest, GroupRequestId, collection::GROUP_REQUEST);
versioned!(GroupOffer, GroupOfferId, collection::GROUP_OFFER);

/// Inserts `doc`, failing if its key is taken.
pub(crate) fn insert_new<T: Versioned>(
    table: &mut HashMap<T::Key, T>,
    doc: &T,
) -> RepositoryResult<()> {
    let key = doc.key();
    if table.contains_key(&key) {
        return Err(RepositoryError::duplicate(T::COLLECTION, key));
    }
    table.insert(key, doc.clone());
    Ok(())
}

/// Checks that the stored copy of `doc` has the same version.
pub(crate) fn ensure_current<T: Versioned>(
    table: &HashMap<T::Key, T>,
    doc: &T,
) -> RepositoryResult<()> {
    let key = doc.key();
    let stored = table
        .get(&key)
        .ok_or_else(|| RepositoryError::not_found(T::COLLECTION, key))?;
    if stored.version() != doc.version() {
        return Err(RepositoryError::version_conflict(
            T::COLLECTION,
            key,
            doc.version(),
            stored.version(),
        ));
    }
    Ok(())
}

/// Compare-and-set: stores `doc` with its version bumped.
pub(crate) fn compare_and_set<T: Versioned>(
    table: &mut HashMap<T::Key, T>,
    doc: &T,
) -> RepositoryResult<T> {
    ensure_current(table, doc)?;
    let mut next = doc.clone();
    next.set_version(doc.version() + 1);
    table.insert(next.key(), next.clone());
    Ok(next)
}

/// Compare-and-set that only bumps the stored version.
pub(crate) fn touch<T: Versioned>(table: &mut HashMap<T::Key, T>, doc: &T) -> RepositoryResult<()> {
    ensure_current(table, doc)?;
    if let Some(stored) = table.get_mut(&doc.key()) {
        stored.set_version(doc.version() + 1);
    }
    Ok(())
}

/// Compare-and-delete.
pub(crate) fn compare_and_remove<T: Versioned>(
    table: &mut HashMap<T::Key, T>,
    doc: &T,
) -> RepositoryResult<()> {
    ensure_current(table, doc)?;
    table.remove(&doc.key());
    Ok(())
}

/// Filters, sorts newest first and clones.
pub(crate) fn newest_first<T, F>(table: &HashMap<T::Key, T>, keep: F) -> Vec<T>
where
    T: Versioned,
    F: Fn(&T) -> bool,
{
    let mut found: Vec<T> = table.values().filter(|d| keep(d)).cloned().collect();
    found.sort_by_key(|d| std::cmp::Reverse(d.created_at()));
    found
}

/// Filters, sorts oldest first and clones.
pub(crate) fn oldest_first<T, F>(table: &HashMap<T::Key, T>, keep: F) -> Vec<T>
where
    T: Versioned,
    F: Fn(&T) -> bool,
{
    let mut found: Vec<T> = table.values().filter(|d| keep(d)).cloned().collect();
    found.sort_by_key(<T as Versioned>::created_at);
    found
}

/// Every collection.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub(crate) requests: HashMap<RequestId, Request>,
    pub(crate) offers: HashMap<OfferId, Offer>,
    pub(crate) groups: HashMap<GroupId, Group>,
    pub(crate) group_requests: HashMap<GroupRequestId, GroupRequest>,
    pub(crate) group_offers: HashMap<GroupOfferId, GroupOffer>,
}

impl Tables {
    fn len(&self) -> usize {
        self.requests.len()
            + self.offers.len()
            + self.groups.len()
            + self.group_requests.len()
            + self.group_offers.len()
    }

    /// Inserts an offer, enforcing one live offer per (request, supplier).
    pub(crate) fn insert_offer(&mut self, offer: &Offer) -> RepositoryResult<()> {
        let taken = self.offers.values().any(|o| {
            o.request_id() == offer.request_id()
                && o.supplier_id() == offer.supplier_id()
                && o.status() != OfferStatus::Rejected
        });
        if taken {
            return Err(RepositoryError::duplicate(
                collection::OFFER,
                format!("{} on request {}", offer.supplier_id(), offer.request_id()),
            ));
        }
        insert_new(&mut self.offers, offer)
    }

    /// Inserts a group offer, enforcing one live offer per (group request, supplier).
    pub(crate) fn insert_group_offer(&mut self, offer: &GroupOffer) -> RepositoryResult<()> {
        let taken = self.group_offers.values().any(|o| {
            o.group_request_id() == offer.group_request_id()
                && o.supplier_id() == offer.supplier_id()
                && o.status() != OfferStatus::Rejected
        });
        if taken {
            return Err(RepositoryError::duplicate(
                collection::GROUP_OFFER,
                format!(
                    "{} on group request {}",
                    offer.supplier_id(),
                    offer.group_request_id()
                ),
            ));
        }
        insert_new(&mut self.group_offers, offer)
    }

    /// Inserts a group request, enforcing one per group.
    pub(crate) fn insert_group_request(&mut self, request: &GroupRequest) -> RepositoryResult<()> {
        if self
            .group_requests
            .values()
            .any(|r| r.group_id() == request.group_id())
        {
            return Err(RepositoryError::duplicate(
                collection::GROUP_REQUEST,
                format!("for group {}", request.group_id()),
            ));
        }
        insert_new(&mut self.group_requests, request)
    }

    /// Applies one batched write.
    ///
    /// A guarded document that is gone is reported as a version conflict
    /// against stored version 0.
    pub(crate) fn apply(&mut self, op: &WriteOp) -> RepositoryResult<()> {
        let applied = match op {
            WriteOp::TouchRequest(r) => touch(&mut self.requests, r),
            WriteOp::UpdateRequest(r) => compare_and_set(&mut self.requests, r).map(drop),
            WriteOp::DeleteRequest(r) => compare_and_remove(&mut self.requests, r),
            WriteOp::InsertOffer(o) => self.insert_offer(o),
            WriteOp::UpdateOffer(o) => compare_and_set(&mut self.offers, o).map(drop),
            WriteOp::DeleteOffer(o) => compare_and_remove(&mut self.offers, o),
            WriteOp::UpdateGroup(g) => compare_and_set(&mut self.groups, g).map(drop),
            WriteOp::TouchGroupRequest(r) => touch(&mut self.group_requests, r),
            WriteOp::InsertGroupRequest(r) => self.insert_group_request(r),
            WriteOp::UpdateGroupRequest(r) => compare_and_set(&mut self.group_requests, r).map(drop),
            WriteOp::InsertGroupOffer(o) => self.insert_group_offer(o),
            WriteOp::UpdateGroupOffer(o) => compare_and_set(&mut self.group_offers, o).map(drop),
        };
        match (applied, op.expected_version()) {
            (Err(RepositoryError::NotFound { entity_type, id }), Some(expected)) => Err(
                RepositoryError::version_conflict(entity_type, id, expected, 0),
            ),
            (applied, _) => applied,
        }
    }
}

/// In-memory implementation of every repository port and [`UnitOfWork`].
///
/// Clones share the same tables.
///
/// [`UnitOfWork`]: crate::infrastructure::persistence::traits::UnitOfWork
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    pub(crate) tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents across all collections.
    pub async fn len(&self) -> usize {
        self.tables.read().await.len()
    }

    /// Returns true if the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes every document.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        *tables = Tables::default();
    }
}
