//! # Group Events
//!
//! Events for buying group membership and lifecycle.

use crate::domain::events::domain_event::{EventMetadata, EventType, impl_domain_event};
use crate::domain::value_objects::{GroupId, GroupRequestId, Quantity, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Event emitted when a vendor starts a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCreated {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The new group.
    pub group_id: GroupId,
    /// Founding leader.
    pub leader_id: UserId,
    /// Pooled item.
    pub item: String,
    /// Leader's initial quantity.
    pub total_quantity: Quantity,
    /// Member cap.
    pub max_members: u32,
}

impl_domain_event!(GroupCreated, EventType::Group, "GroupCreated", |e| e.group_id);

/// Event emitted when a vendor joins a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberJoined {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The group.
    pub group_id: GroupId,
    /// The new member.
    pub user_id: UserId,
    /// Their quantity.
    pub quantity: Quantity,
    /// Group total after joining.
    pub total_quantity: Quantity,
}

impl_domain_event!(MemberJoined, EventType::Group, "MemberJoined", |e| e.group_id);

/// Event emitted when a member leaves a group that lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLeft {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The group.
    pub group_id: GroupId,
    /// The departed member.
    pub user_id: UserId,
    /// Group total after leaving.
    pub total_quantity: Quantity,
}

impl_domain_event!(MemberLeft, EventType::Group, "MemberLeft", |e| e.group_id);

/// Event emitted when leadership changes hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderAssigned {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The group.
    pub group_id: GroupId,
    /// Previous leader.
    pub previous_leader: UserId,
    /// New leader.
    pub new_leader: UserId,
}

impl_domain_event!(LeaderAssigned, EventType::Group, "LeaderAssigned", |e| e.group_id);

/// Event emitted when the last member leaves and the group is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDissolved {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The deleted group.
    pub group_id: GroupId,
    /// The member whose departure emptied it.
    pub last_member: UserId,
}

impl_domain_event!(GroupDissolved, EventType::Group, "GroupDissolved", |e| e.group_id);

/// Event emitted when the leader opens the group request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRequestOpened {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The group.
    pub group_id: GroupId,
    /// The new group request.
    pub group_request_id: GroupRequestId,
    /// Pooled quantity snapshot.
    pub quantity: Quantity,
    /// When the group request expires.
    pub expires_at: Timestamp,
}

impl_domain_event!(GroupRequestOpened, EventType::Listing, "GroupRequestOpened", |e| e
    .group_request_id);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::events::domain_event::DomainEvent;

    #[test]
    fn group_request_opened_is_a_listing_event() {
        let event = GroupRequestOpened {
            metadata: EventMetadata::default(),
            group_id: GroupId::new_v4(),
            group_request_id: GroupRequestId::new_v4(),
            quantity: Quantity::parse("50kg").unwrap(),
            expires_at: Timestamp::now(),
        };
        assert_eq!(event.event_type(), EventType::Listing);
        assert_eq!(event.subject(), event.group_request_id.to_string());
    }

    #[test]
    fn membership_events_are_group_events() {
        let event = MemberLeft {
            metadata: EventMetadata::default(),
            group_id: GroupId::new_v4(),
            user_id: UserId::new("m"),
            total_quantity: Quantity::parse("20kg").unwrap(),
        };
        assert_eq!(event.event_type(), EventType::Group);
        assert_eq!(event.event_name(), "MemberLeft");
    }
}
