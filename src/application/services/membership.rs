//! # Group Membership
//!
//! Buying groups: creation, joining, leaving, leadership, and opening the
//! pooled group request.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::context::MarketplaceContext;
use crate::domain::entities::group::{Group, GroupBuilder, LeaveOutcome};
use crate::domain::entities::group_request::GroupRequest;
use crate::domain::events::{
    EventMetadata, GroupCreated, GroupDissolved, GroupRequestOpened, LeaderAssigned, MemberJoined,
    MemberLeft,
};
use crate::domain::value_objects::{Actor, GroupId, GroupStatus, Price, Quantity, UserId};
use crate::infrastructure::persistence::query::group_matches;
use crate::infrastructure::persistence::traits::collection;
use crate::infrastructure::persistence::{ListingFilter, WriteBatch};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for [`MembershipService::create_group`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroup {
    /// Display name.
    pub name: String,
    /// Free text.
    #[serde(default)]
    pub description: Option<String>,
    /// What the group buys.
    pub item: String,
    /// The leader's own quantity, such as `20kg`.
    pub quantity: String,
    /// Target per-unit price.
    pub desired_price: Decimal,
    /// Delivery location.
    pub location: String,
    /// Member cap; defaults to the configured cap.
    #[serde(default)]
    pub max_members: Option<u32>,
}

impl NewGroup {
    /// Creates input with the required fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        item: impl Into<String>,
        quantity: impl Into<String>,
        desired_price: impl Into<Decimal>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            item: item.into(),
            quantity: quantity.into(),
            desired_price: desired_price.into(),
            location: location.into(),
            ..Self::default()
        }
    }

    /// Sets the member cap.
    #[must_use]
    pub fn with_max_members(mut self, max_members: u32) -> Self {
        self.max_members = Some(max_members);
        self
    }
}

/// Group lifecycle up to the group request.
#[derive(Debug, Clone)]
pub struct MembershipService {
    ctx: Arc<MarketplaceContext>,
}

impl MembershipService {
    /// Creates the service.
    #[must_use]
    pub fn new(ctx: Arc<MarketplaceContext>) -> Self {
        Self { ctx }
    }

    /// Creates a forming group led by the actor.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor is not a vendor
    /// - `Validation` for a malformed quantity, a zero cap or blank text
    pub async fn create_group(&self, actor: &Actor, input: NewGroup) -> ApplicationResult<Group> {
        actor.require_vendor()?;
        let now = self.ctx.now();
        let quantity = Quantity::parse(&input.quantity)?;
        let desired_price = Price::new(input.desired_price)?;

        let mut builder = GroupBuilder::new(
            actor.id().clone(),
            input.name,
            input.item,
            quantity,
            desired_price,
            input.location,
            now.add_days(self.ctx.config.group_ttl_days),
        )
        .max_members(input.max_members.unwrap_or(self.ctx.config.default_max_members));
        if let Some(description) = input.description {
            builder = builder.description(description);
        }
        let group = builder.build(now)?;
        self.ctx.repos.groups.insert(&group).await?;

        info!(group_id = %group.id(), leader = %actor.id(), item = group.item(), "group created");
        self.ctx
            .publish(GroupCreated {
                metadata: EventMetadata::at(now),
                group_id: group.id(),
                leader_id: actor.id().clone(),
                item: group.item().to_string(),
                total_quantity: group.total_quantity().clone(),
                max_members: group.max_members(),
            })
            .await;
        Ok(group)
    }

    /// Adds the actor to a forming group with their quantity.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor is not a vendor
    /// - `InvalidState` if the group is not forming, is full, or already has the actor
    /// - `Validation` for a malformed quantity
    pub async fn join_group(
        &self,
        actor: &Actor,
        group_id: GroupId,
        quantity: &str,
    ) -> ApplicationResult<Group> {
        actor.require_vendor()?;
        let quantity = Quantity::parse(quantity)?;
        let group = self
            .ctx
            .retry
            .run("join_group", || {
                let quantity = quantity.clone();
                async move {
                    let mut group = self.ctx.load_group(group_id).await?;
                    group.join(actor.id().clone(), quantity, self.ctx.now())?;
                    Ok(self.ctx.repos.groups.update(&group).await?)
                }
            })
            .await?;

        info!(
            group_id = %group_id,
            user = %actor.id(),
            total_quantity = %group.total_quantity(),
            "member joined group"
        );
        self.ctx
            .publish(MemberJoined {
                metadata: EventMetadata::at(group.updated_at()),
                group_id,
                user_id: actor.id().clone(),
                quantity,
                total_quantity: group.total_quantity().clone(),
            })
            .await;
        Ok(group)
    }

    /// Removes the actor from a forming group.
    ///
    /// Returns the updated group, or `None` if the actor was the last
    /// member and the group was deleted.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the actor is not a member or leads a group that
    ///   still has other members
    pub async fn leave_group(&self, actor: &Actor, group_id: GroupId) -> ApplicationResult<Option<Group>> {
        let remaining = self
            .ctx
            .retry
            .run("leave_group", || async move {
                let mut group = self.ctx.load_group(group_id).await?;
                match group.leave(actor.id(), self.ctx.now())? {
                    LeaveOutcome::Removed => Ok(Some(self.ctx.repos.groups.update(&group).await?)),
                    LeaveOutcome::Dissolved => {
                        self.ctx.repos.groups.delete(&group).await?;
                        Ok(None)
                    }
                }
            })
            .await?;

        let now = self.ctx.now();
        match &remaining {
            Some(group) => {
                info!(group_id = %group_id, user = %actor.id(), "member left group");
                self.ctx
                    .publish(MemberLeft {
                        metadata: EventMetadata::at(now),
                        group_id,
                        user_id: actor.id().clone(),
                        total_quantity: group.total_quantity().clone(),
                    })
                    .await;
            }
            None => {
                info!(group_id = %group_id, user = %actor.id(), "last member left, group deleted");
                self.ctx
                    .publish(GroupDissolved {
                        metadata: EventMetadata::at(now),
                        group_id,
                        last_member: actor.id().clone(),
                    })
                    .await;
            }
        }
        Ok(remaining)
    }

    /// Hands leadership to another member.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor leads the group
    /// - `InvalidState` if the new leader is not a member
    pub async fn assign_leader(
        &self,
        actor: &Actor,
        group_id: GroupId,
        new_leader: UserId,
    ) -> ApplicationResult<Group> {
        let group = self
            .ctx
            .retry
            .run("assign_leader", || {
                let new_leader = new_leader.clone();
                async move {
                    let mut group = self.ctx.load_group(group_id).await?;
                    group.assign_leader(actor.id(), new_leader, self.ctx.now())?;
                    Ok(self.ctx.repos.groups.update(&group).await?)
                }
            })
            .await?;

        info!(group_id = %group_id, leader = %new_leader, "group leader assigned");
        self.ctx
            .publish(LeaderAssigned {
                metadata: EventMetadata::at(group.updated_at()),
                group_id,
                previous_leader: actor.id().clone(),
                new_leader,
            })
            .await;
        Ok(group)
    }

    /// Opens the group's single group request with the pooled quantity and
    /// moves the group to active, atomically.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor leads the group
    /// - `InvalidState` if the group is not forming or already has a group request
    pub async fn create_group_request(
        &self,
        actor: &Actor,
        group_id: GroupId,
    ) -> ApplicationResult<GroupRequest> {
        let request = self
            .ctx
            .retry
            .run("create_group_request", || async move {
                let now = self.ctx.now();
                let mut group = self.ctx.load_group(group_id).await?;
                group.open_request(actor.id(), now)?;
                if self.ctx.repos.group_requests.get_by_group(&group_id).await?.is_some() {
                    return Err(ApplicationError::invalid_state(
                        "group request already exists for this group",
                    ));
                }
                let request = GroupRequest::open_for(
                    &group,
                    now.add_days(self.ctx.config.group_request_ttl_days),
                    now,
                )?;

                let mut batch = WriteBatch::new();
                batch.update_group(group);
                batch.insert_group_request(request.clone());
                self.ctx.repos.unit_of_work.commit(batch).await?;
                Ok(request)
            })
            .await?;

        info!(
            group_id = %group_id,
            group_request_id = %request.id(),
            quantity = %request.quantity(),
            "group request opened"
        );
        self.ctx
            .publish(GroupRequestOpened {
                metadata: EventMetadata::at(request.created_at()),
                group_id,
                group_request_id: request.id(),
                quantity: request.quantity().clone(),
                expires_at: request.expires_at(),
            })
            .await;
        Ok(request)
    }

    /// Loads a group.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the group does not exist.
    pub async fn get_group(&self, group_id: GroupId) -> ApplicationResult<Group> {
        self.ctx.load_group(group_id).await
    }

    /// Lists the groups the actor belongs to, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the store cannot be read.
    pub async fn list_my_groups(&self, actor: &Actor) -> ApplicationResult<Vec<Group>> {
        Ok(self.ctx.repos.groups.find_by_member(actor.id()).await?)
    }

    /// Lists forming, unexpired groups the actor could join, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the store cannot be read.
    pub async fn list_available_groups(
        &self,
        actor: &Actor,
        filter: &ListingFilter,
    ) -> ApplicationResult<Vec<Group>> {
        let now = self.ctx.now();
        let forming = self.ctx.repos.groups.find_by_status(GroupStatus::Forming).await?;
        Ok(forming
            .into_iter()
            .filter(|g| g.accepts_members_at(now) && !g.is_member(actor.id()))
            .filter(|g| group_matches(g, filter))
            .collect())
    }

    /// Loads the group request of a group.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the group has no group request.
    pub async fn get_group_request_for_group(
        &self,
        group_id: GroupId,
    ) -> ApplicationResult<GroupRequest> {
        let request = self
            .ctx
            .repos
            .group_requests
            .get_by_group(&group_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(collection::GROUP_REQUEST, group_id))?;
        self.ctx.with_group_offer_count(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::services::clock::{Clock, ManualClock};
    use crate::application::services::context::Repositories;
    use crate::config::MarketplaceConfig;
    use crate::domain::value_objects::{GroupRequestStatus, Timestamp};
    use crate::infrastructure::persistence::InMemoryStore;

    fn service() -> (Arc<ManualClock>, MembershipService) {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1_704_067_200).unwrap()));
        let ctx = MarketplaceContext::new(
            Repositories::in_memory(InMemoryStore::new()),
            MarketplaceConfig::default(),
        )
        .with_clock(clock.clone());
        (clock, MembershipService::new(Arc::new(ctx)))
    }

    fn leader() -> Actor {
        Actor::vendor("leader")
    }

    fn rice_group() -> NewGroup {
        NewGroup::new("Rice buyers", "Rice", "20kg", 40, "Delhi")
    }

    #[tokio::test]
    async fn create_group_adds_leader() {
        let (_, service) = service();
        let group = service.create_group(&leader(), rice_group()).await.unwrap();
        assert_eq!(group.status(), GroupStatus::Forming);
        assert_eq!(group.members().len(), 1);
        assert_eq!(group.max_members(), 20);
        assert!(group.is_leader(leader().id()));

        let err = service
            .create_group(&Actor::supplier("s-1"), rice_group())
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn join_recomputes_total() {
        let (_, service) = service();
        let group = service.create_group(&leader(), rice_group()).await.unwrap();

        let group = service
            .join_group(&Actor::vendor("v-2"), group.id(), "30kg")
            .await
            .unwrap();
        assert_eq!(group.total_quantity().as_str(), "50kg");

        let err = service
            .join_group(&Actor::vendor("v-2"), group.id(), "5kg")
            .await
            .unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[tokio::test]
    async fn join_full_group_fails() {
        let (_, service) = service();
        let group = service
            .create_group(&leader(), rice_group().with_max_members(1))
            .await
            .unwrap();
        let err = service
            .join_group(&Actor::vendor("v-2"), group.id(), "5kg")
            .await
            .unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[tokio::test]
    async fn leader_must_reassign_before_leaving() {
        let (_, service) = service();
        let group = service.create_group(&leader(), rice_group()).await.unwrap();
        service
            .join_group(&Actor::vendor("v-2"), group.id(), "10kg")
            .await
            .unwrap();

        let err = service.leave_group(&leader(), group.id()).await.unwrap_err();
        assert!(err.is_invalid_state());

        let err = service
            .assign_leader(&Actor::vendor("v-2"), group.id(), UserId::new("v-2"))
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        service
            .assign_leader(&leader(), group.id(), UserId::new("v-2"))
            .await
            .unwrap();
        let remaining = service.leave_group(&leader(), group.id()).await.unwrap().unwrap();
        assert_eq!(remaining.leader_id(), &UserId::new("v-2"));
        assert_eq!(remaining.total_quantity().as_str(), "10kg");
    }

    #[tokio::test]
    async fn sole_leader_leaving_deletes_group() {
        let (_, service) = service();
        let group = service.create_group(&leader(), rice_group()).await.unwrap();
        assert!(service.leave_group(&leader(), group.id()).await.unwrap().is_none());
        assert!(service.get_group(group.id()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn sole_leader_leaving_active_group_deletes_it() {
        let (_, service) = service();
        let group = service.create_group(&leader(), rice_group()).await.unwrap();
        service
            .join_group(&Actor::vendor("v-2"), group.id(), "30kg")
            .await
            .unwrap();
        service.create_group_request(&leader(), group.id()).await.unwrap();

        let remaining = service
            .leave_group(&Actor::vendor("v-2"), group.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remaining.status(), GroupStatus::Active);
        assert_eq!(remaining.total_quantity().as_str(), "20kg");

        assert!(service.leave_group(&leader(), group.id()).await.unwrap().is_none());
        assert!(service.get_group(group.id()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn group_request_opens_once() {
        let (clock, service) = service();
        let group = service.create_group(&leader(), rice_group()).await.unwrap();
        service
            .join_group(&Actor::vendor("v-2"), group.id(), "30kg")
            .await
            .unwrap();

        let err = service
            .create_group_request(&Actor::vendor("v-2"), group.id())
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        let request = service.create_group_request(&leader(), group.id()).await.unwrap();
        assert_eq!(request.status(), GroupRequestStatus::Active);
        assert_eq!(request.quantity().as_str(), "50kg");
        assert_eq!(request.expires_at(), clock.now().add_days(3));

        let group = service.get_group(group.id()).await.unwrap();
        assert_eq!(group.status(), GroupStatus::Active);

        let err = service.create_group_request(&leader(), group.id()).await.unwrap_err();
        assert!(err.is_invalid_state());

        let found = service.get_group_request_for_group(group.id()).await.unwrap();
        assert_eq!(found.id(), request.id());
    }

    #[tokio::test]
    async fn available_groups_exclude_members_and_expired() {
        let (clock, service) = service();
        let rice = service.create_group(&leader(), rice_group()).await.unwrap();
        service
            .create_group(
                &Actor::vendor("other"),
                NewGroup::new("Wheat buyers", "Wheat", "10kg", 30, "Kanpur"),
            )
            .await
            .unwrap();

        let visitor = Actor::vendor("visitor");
        let all = service
            .list_available_groups(&visitor, &ListingFilter::new())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let rice_only = service
            .list_available_groups(&visitor, &ListingFilter::new().item("rice"))
            .await
            .unwrap();
        assert_eq!(rice_only.len(), 1);
        assert_eq!(rice_only[0].id(), rice.id());

        let mine = service
            .list_available_groups(&leader(), &ListingFilter::new())
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        clock.advance_days(8);
        assert!(service
            .list_available_groups(&visitor, &ListingFilter::new())
            .await
            .unwrap()
            .is_empty());
    }
}
