//! # Group Aggregate
//!
//! A buying group pooling demand for one item under a leader.
//!
//! # State Machine
//!
//! ```text
//! Forming → Active → Negotiating → DealClosed
//!    │        │          │
//!    └────────┴──────────┴→ Cancelled
//! ```
//!
//! Members may only join while the group is `Forming` but may leave in any
//! status. The leader opens the single group request, which moves the group
//! to `Active`.
//!
//! # Invariants
//!
//! - The leader is always a member
//! - Members are unique by user and never exceed `max_members`
//! - `total_quantity` is the aggregate of every member's quantity
//! - A group with no members does not exist (leaving last dissolves it)

use crate::domain::entities::request::non_blank;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::services::quantity_aggregation::QuantityAggregator;
use crate::domain::value_objects::{GroupId, GroupStatus, Price, Quantity, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Member cap applied when the creator does not choose one.
pub const DEFAULT_MAX_MEMBERS: u32 = 20;

/// One participant of a group and the quantity they need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Member's user id.
    pub user_id: UserId,
    /// Quantity this member contributes.
    pub quantity: Quantity,
    /// When the member joined.
    pub joined_at: Timestamp,
}

/// What happened when a member left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The member was removed; the group lives on.
    Removed,
    /// The last member left; the group must be deleted.
    Dissolved,
}

/// A buying group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    id: GroupId,
    name: String,
    description: String,
    leader_id: UserId,
    members: Vec<GroupMember>,
    max_members: u32,
    item: String,
    total_quantity: Quantity,
    desired_price: Price,
    location: String,
    status: GroupStatus,
    expires_at: Timestamp,
    created_at: Timestamp,
    updated_at: Timestamp,
    version: u64,
}

impl Group {
    // ========== Accessors ==========

    /// Returns the group ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Returns the group name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the current leader.
    #[inline]
    #[must_use]
    pub fn leader_id(&self) -> &UserId {
        &self.leader_id
    }

    /// Returns the members in join order.
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }

    /// Returns the member cap.
    #[inline]
    #[must_use]
    pub fn max_members(&self) -> u32 {
        self.max_members
    }

    /// Returns the pooled item.
    #[inline]
    #[must_use]
    pub fn item(&self) -> &str {
        &self.item
    }

    /// Returns the aggregated quantity of all members.
    #[inline]
    #[must_use]
    pub fn total_quantity(&self) -> &Quantity {
        &self.total_quantity
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
    pub fn status(&self) -> GroupStatus {
        self.status
    }

    /// Returns the expiry instant.
    #[inline]
    #[must_use]
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Returns when the group was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the group was last updated.
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

    /// Returns true if `user` is a member.
    #[must_use]
    pub fn is_member(&self, user: &UserId) -> bool {
        self.members.iter().any(|m| &m.user_id == user)
    }

    /// Returns true if `user` is the current leader.
    #[inline]
    #[must_use]
    pub fn is_leader(&self, user: &UserId) -> bool {
        &self.leader_id == user
    }

    /// Returns true if the member cap is reached.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_members as usize
    }

    /// Returns true if the group is forming and not yet expired.
    #[must_use]
    pub fn accepts_members_at(&self, now: Timestamp) -> bool {
        self.status == GroupStatus::Forming && !self.expires_at.has_passed(now)
    }

    // ========== Membership ==========

    /// Adds a member.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` if the group is not forming or has expired
    /// - `DomainError::GroupFull` if the cap is reached
    /// - `DomainError::AlreadyMember` if the user already belongs to the group
    pub fn join(&mut self, user_id: UserId, quantity: Quantity, now: Timestamp) -> DomainResult<()> {
        if self.status != GroupStatus::Forming {
            return Err(DomainError::invalid_state(format!(
                "group is {} and no longer accepting members",
                self.status
            )));
        }
        if self.expires_at.has_passed(now) {
            return Err(DomainError::invalid_state("group has expired"));
        }
        if self.is_full() {
            return Err(DomainError::GroupFull {
                max_members: self.max_members,
            });
        }
        if self.is_member(&user_id) {
            return Err(DomainError::AlreadyMember(user_id));
        }

        self.members.push(GroupMember {
            user_id,
            quantity,
            joined_at: now,
        });
        self.recompute_total();
        self.updated_at = now;
        Ok(())
    }

    /// Removes a member.
    ///
    /// # Errors
    ///
    /// - `DomainError::NotAMember` if the user is not in the group
    /// - `DomainError::LeaderMustReassign` if the leader leaves while others remain
    pub fn leave(&mut self, user_id: &UserId, now: Timestamp) -> DomainResult<LeaveOutcome> {
        if !self.is_member(user_id) {
            return Err(DomainError::NotAMember(user_id.clone()));
        }
        if self.is_leader(user_id) && self.members.len() > 1 {
            return Err(DomainError::LeaderMustReassign);
        }
        self.members.retain(|m| &m.user_id != user_id);
        if self.members.is_empty() {
            return Ok(LeaveOutcome::Dissolved);
        }
        self.recompute_total();
        self.updated_at = now;
        Ok(LeaveOutcome::Removed)
    }

    /// Hands leadership to another member.
    ///
    /// # Errors
    ///
    /// - `DomainError::Forbidden` if `caller` is not the leader
    /// - `DomainError::NotAMember` if the new leader is not a member
    pub fn assign_leader(
        &mut self,
        caller: &UserId,
        new_leader: UserId,
        now: Timestamp,
    ) -> DomainResult<()> {
        if !self.is_leader(caller) {
            return Err(DomainError::forbidden("only the group leader can assign a new leader"));
        }
        if !self.is_member(&new_leader) {
            return Err(DomainError::NotAMember(new_leader));
        }
        self.leader_id = new_leader;
        self.updated_at = now;
        Ok(())
    }

    // ========== Lifecycle ==========

    /// Moves a forming group to active as its request is opened.
    ///
    /// # Errors
    ///
    /// - `DomainError::Forbidden` if `caller` is not the leader
    /// - `DomainError::InvalidState` if the group is not forming
    pub fn open_request(&mut self, caller: &UserId, now: Timestamp) -> DomainResult<()> {
        if !self.is_leader(caller) {
            return Err(DomainError::forbidden(
                "only the group leader can create the group request",
            ));
        }
        if self.status != GroupStatus::Forming {
            return Err(DomainError::invalid_state(format!(
                "group request already exists or group is {}",
                self.status
            )));
        }
        self.status = GroupStatus::Active;
        self.updated_at = now;
        Ok(())
    }

    /// Notes that the leader has started countering offers.
    ///
    /// Returns true if the status changed.
    pub fn start_negotiating(&mut self, now: Timestamp) -> bool {
        if self.status != GroupStatus::Active {
            return false;
        }
        self.status = GroupStatus::Negotiating;
        self.updated_at = now;
        true
    }

    /// Closes the group after its request settled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` unless the group is active or negotiating.
    pub fn close_deal(&mut self, now: Timestamp) -> DomainResult<()> {
        if !matches!(self.status, GroupStatus::Active | GroupStatus::Negotiating) {
            return Err(DomainError::invalid_state(format!(
                "cannot close a deal for a group that is {}",
                self.status
            )));
        }
        self.status = GroupStatus::DealClosed;
        self.updated_at = now;
        Ok(())
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn recompute_total(&mut self) {
        self.total_quantity = QuantityAggregator::aggregate_or(
            self.members.iter().map(|m| &m.quantity),
            &self.total_quantity,
        );
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Group({} '{}' {} members, {} {} [{}])",
            self.id,
            self.name,
            self.members.len(),
            self.total_quantity,
            self.item,
            self.status
        )
    }
}

/// Builder for constructing [`Group`] instances.
#[derive(Debug, Clone)]
pub struct GroupBuilder {
    leader_id: UserId,
    name: String,
    item: String,
    quantity: Quantity,
    desired_price: Price,
    location: String,
    expires_at: Timestamp,
    description: String,
    max_members: u32,
}

impl GroupBuilder {
    /// Creates a builder with the required fields.
    ///
    /// `quantity` is the leader's own contribution.
    #[must_use]
    pub fn new(
        leader_id: UserId,
        name: impl Into<String>,
        item: impl Into<String>,
        quantity: Quantity,
        desired_price: Price,
        location: impl Into<String>,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            leader_id,
            name: name.into(),
            item: item.into(),
            quantity,
            desired_price,
            location: location.into(),
            expires_at,
            description: String::new(),
            max_members: DEFAULT_MAX_MEMBERS,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the member cap.
    #[must_use]
    pub fn max_members(mut self, max_members: u32) -> Self {
        self.max_members = max_members;
        self
    }

    /// Validates and builds the group with the leader as first member.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` for blank text fields, a zero
    /// member cap, or an expiry that is not in the future.
    pub fn build(self, now: Timestamp) -> DomainResult<Group> {
        if self.max_members == 0 {
            return Err(DomainError::validation("max members must be at least 1"));
        }
        if self.expires_at.has_passed(now) {
            return Err(DomainError::validation("expiry must be in the future"));
        }
        Ok(Group {
            id: GroupId::new_v4(),
            name: non_blank("name", self.name)?,
            description: self.description.trim().to_string(),
            leader_id: self.leader_id.clone(),
            members: vec![GroupMember {
                user_id: self.leader_id,
                quantity: self.quantity.clone(),
                joined_at: now,
            }],
            max_members: self.max_members,
            item: non_blank("item", self.item)?,
            total_quantity: self.quantity,
            desired_price: self.desired_price,
            location: non_blank("location", self.location)?,
            status: GroupStatus::Forming,
            expires_at: self.expires_at,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;

    fn now() -> Timestamp {
        Timestamp::from_secs(1_704_067_200).unwrap()
    }

    fn qty(s: &str) -> Quantity {
        Quantity::parse(s).unwrap()
    }

    fn group(max_members: u32) -> Group {
        GroupBuilder::new(
            UserId::new("leader"),
            "Rice buyers",
            "Rice",
            qty("20kg"),
            Price::new(40).unwrap(),
            "Nashik",
            now().add_days(7),
        )
        .max_members(max_members)
        .build(now())
        .unwrap()
    }

    #[test]
    fn leader_is_first_member() {
        let g = group(5);
        assert_eq!(g.members().len(), 1);
        assert!(g.is_member(&UserId::new("leader")));
        assert!(g.is_leader(&UserId::new("leader")));
        assert_eq!(g.total_quantity().as_str(), "20kg");
        assert_eq!(g.status(), GroupStatus::Forming);
    }

    #[test]
    fn zero_cap_rejected() {
        let result = GroupBuilder::new(
            UserId::new("l"),
            "g",
            "i",
            qty("1kg"),
            Price::new(1).unwrap(),
            "x",
            now().add_days(1),
        )
        .max_members(0)
        .build(now());
        assert!(result.is_err());
    }

    #[test]
    fn join_recomputes_total_and_skips_other_units() {
        let mut g = group(5);
        g.join(UserId::new("a"), qty("30kg"), now()).unwrap();
        g.join(UserId::new("b"), qty("5lb"), now()).unwrap();
        assert_eq!(g.members().len(), 3);
        assert_eq!(g.total_quantity().as_str(), "50kg");
    }

    #[test]
    fn join_when_full_fails() {
        let mut g = group(2);
        g.join(UserId::new("a"), qty("1kg"), now()).unwrap();
        let err = g.join(UserId::new("b"), qty("1kg"), now()).unwrap_err();
        assert_eq!(err, DomainError::GroupFull { max_members: 2 });
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn double_join_fails() {
        let mut g = group(5);
        g.join(UserId::new("a"), qty("1kg"), now()).unwrap();
        let err = g.join(UserId::new("a"), qty("1kg"), now()).unwrap_err();
        assert!(matches!(err, DomainError::AlreadyMember(_)));
        assert_eq!(g.members().len(), 2);
    }

    #[test]
    fn join_after_expiry_fails() {
        let mut g = group(5);
        let err = g.join(UserId::new("a"), qty("1kg"), now().add_days(8)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn leader_cannot_leave_with_members() {
        let mut g = group(5);
        g.join(UserId::new("a"), qty("1kg"), now()).unwrap();
        let err = g.leave(&UserId::new("leader"), now()).unwrap_err();
        assert_eq!(err, DomainError::LeaderMustReassign);
    }

    #[test]
    fn sole_leader_leaving_dissolves() {
        let mut g = group(5);
        assert_eq!(
            g.leave(&UserId::new("leader"), now()).unwrap(),
            LeaveOutcome::Dissolved
        );
    }

    #[test]
    fn member_leaving_recomputes() {
        let mut g = group(5);
        g.join(UserId::new("a"), qty("30kg"), now()).unwrap();
        assert_eq!(
            g.leave(&UserId::new("a"), now()).unwrap(),
            LeaveOutcome::Removed
        );
        assert_eq!(g.total_quantity().as_str(), "20kg");
    }

    #[test]
    fn members_leave_an_active_group() {
        let mut g = group(5);
        g.join(UserId::new("a"), qty("30kg"), now()).unwrap();
        g.open_request(&UserId::new("leader"), now()).unwrap();

        assert_eq!(
            g.leave(&UserId::new("a"), now()).unwrap(),
            LeaveOutcome::Removed
        );
        assert_eq!(g.status(), GroupStatus::Active);
        assert_eq!(
            g.leave(&UserId::new("leader"), now()).unwrap(),
            LeaveOutcome::Dissolved
        );
    }

    #[test]
    fn non_member_cannot_leave() {
        let mut g = group(5);
        let err = g.leave(&UserId::new("stranger"), now()).unwrap_err();
        assert!(matches!(err, DomainError::NotAMember(_)));
    }

    #[test]
    fn assign_leader_rules() {
        let mut g = group(5);
        g.join(UserId::new("a"), qty("1kg"), now()).unwrap();

        let err = g
            .assign_leader(&UserId::new("a"), UserId::new("a"), now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = g
            .assign_leader(&UserId::new("leader"), UserId::new("zed"), now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        g.assign_leader(&UserId::new("leader"), UserId::new("a"), now())
            .unwrap();
        assert!(g.is_leader(&UserId::new("a")));
        assert_eq!(
            g.leave(&UserId::new("leader"), now()).unwrap(),
            LeaveOutcome::Removed
        );
    }

    #[test]
    fn lifecycle_transitions() {
        let mut g = group(5);
        assert!(g.open_request(&UserId::new("a"), now()).is_err());
        g.open_request(&UserId::new("leader"), now()).unwrap();
        assert_eq!(g.status(), GroupStatus::Active);
        assert!(g.open_request(&UserId::new("leader"), now()).is_err());

        assert!(g.start_negotiating(now()));
        assert!(!g.start_negotiating(now()));
        g.close_deal(now()).unwrap();
        assert_eq!(g.status(), GroupStatus::DealClosed);
        assert!(g.close_deal(now()).is_err());
    }
}
