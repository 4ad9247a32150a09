//! # In-Memory Group Request Repository
//!
//! [`GroupRequestRepository`] over the shared [`InMemoryStore`] tables.

use crate::domain::entities::group_request::GroupRequest;
use crate::domain::value_objects::{GroupId, GroupRequestId};
use crate::infrastructure::persistence::in_memory::store::{
    InMemoryStore, compare_and_set, newest_first,
};
use crate::infrastructure::persistence::query::GroupRequestQuery;
use crate::infrastructure::persistence::traits::{GroupRequestRepository, RepositoryResult};
use async_trait::async_trait;

#[async_trait]
impl GroupRequestRepository for InMemoryStore {
    async fn insert(&self, request: &GroupRequest) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        tables.insert_group_request(request)
    }

    async fn get(&self, id: &GroupRequestId) -> RepositoryResult<Option<GroupRequest>> {
        let tables = self.tables.read().await;
        Ok(tables.group_requests.get(id).cloned())
    }

    async fn get_by_group(&self, group_id: &GroupId) -> RepositoryResult<Option<GroupRequest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .group_requests
            .values()
            .find(|r| r.group_id() == *group_id)
            .cloned())
    }

    async fn find(&self, query: &GroupRequestQuery) -> RepositoryResult<Vec<GroupRequest>> {
        let tables = self.tables.read().await;
        let found = newest_first(&tables.group_requests, |r| query.matches(r));
        Ok(match query.window {
            Some(window) => window.apply(found),
            None => found,
        })
    }

    async fn count(&self, query: &GroupRequestQuery) -> RepositoryResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .group_requests
            .values()
            .filter(|r| query.matches(r))
            .count() as u64)
    }

    async fn update(&self, request: &GroupRequest) -> RepositoryResult<GroupRequest> {
        let mut tables = self.tables.write().await;
        compare_and_set(&mut tables.group_requests, request)
    }
}
