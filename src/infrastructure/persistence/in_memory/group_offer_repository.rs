//! # In-Memory Group Offer Repository
//!
//! [`GroupOfferRepository`] over the shared [`InMemoryStore`] tables.

use crate::domain::entities::group_offer::GroupOffer;
use crate::domain::value_objects::{GroupOfferId, GroupRequestId, UserId};
use crate::infrastructure::persistence::in_memory::store::{
    InMemoryStore, compare_and_set, newest_first, oldest_first,
};
use crate::infrastructure::persistence::traits::{GroupOfferRepository, RepositoryResult};
use async_trait::async_trait;

#[async_trait]
impl GroupOfferRepository for InMemoryStore {
    async fn insert(&self, offer: &GroupOffer) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        tables.insert_group_offer(offer)
    }

    async fn get(&self, id: &GroupOfferId) -> RepositoryResult<Option<GroupOffer>> {
        let tables = self.tables.read().await;
        Ok(tables.group_offers.get(id).cloned())
    }

    async fn find_by_group_request(
        &self,
        group_request_id: &GroupRequestId,
    ) -> RepositoryResult<Vec<GroupOffer>> {
        let tables = self.tables.read().await;
        Ok(oldest_first(&tables.group_offers, |o| {
            o.group_request_id() == *group_request_id
        }))
    }

    async fn find_by_supplier(&self, supplier_id: &UserId) -> RepositoryResult<Vec<GroupOffer>> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.group_offers, |o| {
            o.supplier_id() == supplier_id
        }))
    }

    async fn count_by_group_request(
        &self,
        group_request_id: &GroupRequestId,
    ) -> RepositoryResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .group_offers
            .values()
            .filter(|o| o.group_request_id() == *group_request_id)
            .count() as u64)
    }

    async fn update(&self, offer: &GroupOffer) -> RepositoryResult<GroupOffer> {
        let mut tables = self.tables.write().await;
        compare_and_set(&mut tables.group_offers, offer)
    }
}
