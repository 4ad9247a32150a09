//! # In-Memory Request Repository
//!
//! [`RequestRepository`] over the shared [`InMemoryStore`] tables.

use crate::domain::entities::request::Request;
use crate::domain::value_objects::RequestId;
use crate::infrastructure::persistence::in_memory::store::{
    InMemoryStore, compare_and_set, insert_new, newest_first,
};
use crate::infrastructure::persistence::query::RequestQuery;
use crate::infrastructure::persistence::traits::{RepositoryResult, RequestRepository};
use async_trait::async_trait;

#[async_trait]
impl RequestRepository for InMemoryStore {
    async fn insert(&self, request: &Request) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        insert_new(&mut tables.requests, request)
    }

    async fn get(&self, id: &RequestId) -> RepositoryResult<Option<Request>> {
        let tables = self.tables.read().await;
        Ok(tables.requests.get(id).cloned())
    }

    async fn find(&self, query: &RequestQuery) -> RepositoryResult<Vec<Request>> {
        let tables = self.tables.read().await;
        let found = newest_first(&tables.requests, |r| query.matches(r));
        Ok(match query.window {
            Some(window) => window.apply(found),
            None => found,
        })
    }

    async fn count(&self, query: &RequestQuery) -> RepositoryResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.requests.values().filter(|r| query.matches(r)).count() as u64)
    }

    async fn update(&self, request: &Request) -> RepositoryResult<Request> {
        let mut tables = self.tables.write().await;
        compare_and_set(&mut tables.requests, request)
    }

    async fn delete(&self, id: &RequestId) -> RepositoryResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.requests.remove(id).is_some())
    }
}
