//! # In-Memory Unit of Work
//!
//! Commits a [`WriteBatch`] against a staged copy of the tables and swaps it
//! in only if every op succeeded.

use crate::infrastructure::persistence::in_memory::store::InMemoryStore;
use crate::infrastructure::persistence::traits::{RepositoryResult, UnitOfWork, WriteBatch};
use async_trait::async_trait;

#[async_trait]
impl UnitOfWork for InMemoryStore {
    async fn commit(&self, batch: WriteBatch) -> RepositoryResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();
        for op in batch.ops() {
            if let Err(err) = staged.apply(op) {
                tracing::debug!(
                    collection = op.collection(),
                    error = %err,
                    ops = batch.len(),
                    "write batch rolled back"
                );
                return Err(err);
            }
        }
        *tables = staged;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::offer::{Offer, OfferTerms};
    use crate::domain::entities::request::{Request, RequestBuilder};
    use crate::domain::services::NegotiationEngine;
    use crate::domain::value_objects::{Price, Quantity, Timestamp, UserId};
    use crate::infrastructure::persistence::traits::{OfferRepository, RequestRepository};

    fn now() -> Timestamp {
        Timestamp::from_secs(1_704_067_200).unwrap()
    }

    async fn seeded() -> (InMemoryStore, Request, Offer, Offer) {
        let store = InMemoryStore::new();
        let request = RequestBuilder::new(
            UserId::new("v1"),
            "Potatoes",
            Quantity::parse("200kg").unwrap(),
            Price::new(18).unwrap(),
            "Agra",
            now().add_days(7),
        )
        .build(now())
        .unwrap();
        RequestRepository::insert(&store, &request).await.unwrap();
        let a = Offer::new(
            request.id(),
            UserId::new("s1"),
            OfferTerms::new(Price::new(17).unwrap(), "2 days"),
            now(),
        )
        .unwrap();
        let b = Offer::new(
            request.id(),
            UserId::new("s2"),
            OfferTerms::new(Price::new(16).unwrap(), "4 days"),
            now(),
        )
        .unwrap();
        OfferRepository::insert(&store, &a).await.unwrap();
        OfferRepository::insert(&store, &b).await.unwrap();
        (store, request, a, b)
    }

    #[tokio::test]
    async fn batch_applies_every_write() {
        let (store, mut request, mut a, mut b) = seeded().await;
        request.fulfil(a.id(), now()).unwrap();
        NegotiationEngine::reject_on_cascade(&mut a, "x", now()).unwrap();
        NegotiationEngine::reject_on_cascade(&mut b, "x", now()).unwrap();

        let mut batch = WriteBatch::new();
        batch
            .update_request(request.clone())
            .update_offer(a.clone())
            .update_offer(b.clone());
        store.commit(batch).await.unwrap();

        let stored = RequestRepository::get(&store, &request.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.version(), 2);
        assert_eq!(stored.accepted_offer_id(), Some(a.id()));
    }

    #[tokio::test]
    async fn stale_document_rolls_back_whole_batch() {
        let (store, mut request, a, mut b) = seeded().await;

        // Someone else touches offer b first.
        OfferRepository::update(&store, &b).await.unwrap();

        request.fulfil(a.id(), now()).unwrap();
        NegotiationEngine::reject_on_cascade(&mut b, "x", now()).unwrap();
        let mut batch = WriteBatch::new();
        batch.update_request(request.clone()).update_offer(b);
        let err = store.commit(batch).await.unwrap_err();
        assert!(err.is_version_conflict());

        let untouched = RequestRepository::get(&store, &request.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.version(), 1);
        assert!(untouched.accepted_offer_id().is_none());
    }

    #[tokio::test]
    async fn offer_insert_is_tied_to_the_listing_it_checked() {
        let (store, request, a, _) = seeded().await;
        let late = Offer::new(
            request.id(),
            UserId::new("s3"),
            OfferTerms::new(Price::new(15).unwrap(), "1 day"),
            now(),
        )
        .unwrap();

        // The request settles after the late bidder read it.
        let mut settled = request.clone();
        settled.fulfil(a.id(), now()).unwrap();
        RequestRepository::update(&store, &settled).await.unwrap();

        let mut batch = WriteBatch::new();
        batch.touch_request(request.clone()).insert_offer(late.clone());
        assert!(store.commit(batch).await.unwrap_err().is_version_conflict());
        assert!(OfferRepository::get(&store, &late.id()).await.unwrap().is_none());

        let current = RequestRepository::get(&store, &request.id())
            .await
            .unwrap()
            .unwrap();
        let mut batch = WriteBatch::new();
        batch.touch_request(current.clone()).insert_offer(late.clone());
        store.commit(batch).await.unwrap();
        let touched = RequestRepository::get(&store, &request.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(touched.version(), current.version() + 1);
        assert_eq!(touched.status(), current.status());
    }

    #[tokio::test]
    async fn withdrawn_rival_turns_batch_into_conflict() {
        let (store, mut request, mut a, b) = seeded().await;
        let mut stale_b = b.clone();
        let mut batch = WriteBatch::new();
        batch.delete_offer(b);
        store.commit(batch).await.unwrap();

        request.fulfil(a.id(), now()).unwrap();
        NegotiationEngine::reject_on_cascade(&mut a, "x", now()).unwrap();
        NegotiationEngine::reject_on_cascade(&mut stale_b, "x", now()).unwrap();
        let mut batch = WriteBatch::new();
        batch.update_request(request).update_offer(a).update_offer(stale_b);
        assert!(store.commit(batch).await.unwrap_err().is_version_conflict());
    }

    #[tokio::test]
    async fn cascade_delete_in_one_batch() {
        let (store, request, a, b) = seeded().await;
        let mut batch = WriteBatch::new();
        batch.delete_offer(a).delete_offer(b).delete_request(request.clone());
        store.commit(batch).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let store = InMemoryStore::new();
        store.commit(WriteBatch::new()).await.unwrap();
    }
}
