//! # In-Memory Offer Repository
//!
//! [`OfferRepository`] over the shared [`InMemoryStore`] tables.

use crate::domain::entities::offer::Offer;
use crate::domain::value_objects::{OfferId, OfferStatus, RequestId, UserId};
use crate::infrastructure::persistence::in_memory::store::{
    InMemoryStore, compare_and_set, newest_first, oldest_first,
};
use crate::infrastructure::persistence::traits::{OfferRepository, RepositoryResult};
use async_trait::async_trait;

#[async_trait]
impl OfferRepository for InMemoryStore {
    async fn insert(&self, offer: &Offer) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        tables.insert_offer(offer)
    }

    async fn get(&self, id: &OfferId) -> RepositoryResult<Option<Offer>> {
        let tables = self.tables.read().await;
        Ok(tables.offers.get(id).cloned())
    }

    async fn find_by_request(&self, request_id: &RequestId) -> RepositoryResult<Vec<Offer>> {
        let tables = self.tables.read().await;
        Ok(oldest_first(&tables.offers, |o| {
            o.request_id() == *request_id
        }))
    }

    async fn find_by_supplier(
        &self,
        supplier_id: &UserId,
        status: Option<OfferStatus>,
    ) -> RepositoryResult<Vec<Offer>> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.offers, |o| {
            o.supplier_id() == supplier_id && status.is_none_or(|s| o.status() == s)
        }))
    }

    async fn count_by_request(&self, request_id: &RequestId) -> RepositoryResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .offers
            .values()
            .filter(|o| o.request_id() == *request_id)
            .count() as u64)
    }

    async fn update(&self, offer: &Offer) -> RepositoryResult<Offer> {
        let mut tables = self.tables.write().await;
        compare_and_set(&mut tables.offers, offer)
    }

    async fn delete(&self, id: &OfferId) -> RepositoryResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.offers.remove(id).is_some())
    }
}
