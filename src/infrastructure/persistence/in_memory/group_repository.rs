//! # In-Memory Group Repository
//!
//! [`GroupRepository`] over the shared [`InMemoryStore`] tables.

use crate::domain::entities::group::Group;
use crate::domain::value_objects::{GroupId, GroupStatus, UserId};
use crate::infrastructure::persistence::in_memory::store::{
    InMemoryStore, compare_and_remove, compare_and_set, insert_new, newest_first,
};
use crate::infrastructure::persistence::traits::{GroupRepository, RepositoryResult};
use async_trait::async_trait;

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn insert(&self, group: &Group) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        insert_new(&mut tables.groups, group)
    }

    async fn get(&self, id: &GroupId) -> RepositoryResult<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.get(id).cloned())
    }

    async fn find_by_member(&self, user: &UserId) -> RepositoryResult<Vec<Group>> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.groups, |g| g.is_member(user)))
    }

    async fn find_by_status(&self, status: GroupStatus) -> RepositoryResult<Vec<Group>> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.groups, |g| g.status() == status))
    }

    async fn update(&self, group: &Group) -> RepositoryResult<Group> {
        let mut tables = self.tables.write().await;
        compare_and_set(&mut tables.groups, group)
    }

    async fn delete(&self, group: &Group) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        compare_and_remove(&mut tables.groups, group)
    }
}
