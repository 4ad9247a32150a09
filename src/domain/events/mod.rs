//! # Domain Events
//!
//! Events emitted during domain operations for audit and integration.
//!
//! ## Listing Events
//!
//! - [`RequestCreated`], [`RequestClosed`], [`RequestDeleted`]
//! - [`GroupRequestOpened`]
//! - [`ListingExpired`]
//!
//! ## Negotiation Events
//!
//! - [`OfferPlaced`], [`OfferCountered`], [`OfferRejected`], [`OfferWithdrawn`]
//!
//! ## Settlement Events
//!
//! - [`ListingSettled`]: One bid accepted, all rivals rejected
//!
//! ## Group Events
//!
//! - [`GroupCreated`], [`MemberJoined`], [`MemberLeft`], [`LeaderAssigned`], [`GroupDissolved`]

pub mod domain_event;
pub mod group_events;
pub mod listing_events;

pub use domain_event::{BidRef, DomainEvent, EventMetadata, EventType, ListingRef};
pub use group_events::{
    GroupCreated, GroupDissolved, GroupRequestOpened, LeaderAssigned, MemberJoined, MemberLeft,
};
pub use listing_events::{
    ListingExpired, ListingSettled, OfferCountered, OfferPlaced, OfferRejected, OfferWithdrawn,
    RequestClosed, RequestCreated, RequestDeleted,
};

use crate::domain::value_objects::{EventId, Timestamp};
use serde::{Deserialize, Serialize};

/// Any event the marketplace publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MarketplaceEvent {
    /// A request was posted.
    RequestCreated(RequestCreated),
    /// A request was closed early.
    RequestClosed(RequestClosed),
    /// A request was deleted.
    RequestDeleted(RequestDeleted),
    /// A bid was placed.
    OfferPlaced(OfferPlaced),
    /// A bid's terms changed.
    OfferCountered(OfferCountered),
    /// A bid was rejected.
    OfferRejected(OfferRejected),
    /// A bid was withdrawn.
    OfferWithdrawn(OfferWithdrawn),
    /// A listing was settled.
    ListingSettled(ListingSettled),
    /// A listing expired.
    ListingExpired(ListingExpired),
    /// A group was created.
    GroupCreated(GroupCreated),
    /// A member joined.
    MemberJoined(MemberJoined),
    /// A member left.
    MemberLeft(MemberLeft),
    /// Leadership changed.
    LeaderAssigned(LeaderAssigned),
    /// A group was dissolved.
    GroupDissolved(GroupDissolved),
    /// A group request was opened.
    GroupRequestOpened(GroupRequestOpened),
}

macro_rules! dispatch {
    ($self:ident, $e:ident => $body:expr) => {
        match $self {
            Self::RequestCreated($e) => $body,
            Self::RequestClosed($e) => $body,
            Self::RequestDeleted($e) => $body,
            Self::OfferPlaced($e) => $body,
            Self::OfferCountered($e) => $body,
            Self::OfferRejected($e) => $body,
            Self::OfferWithdrawn($e) => $body,
            Self::ListingSettled($e) => $body,
            Self::ListingExpired($e) => $body,
            Self::GroupCreated($e) => $body,
            Self::MemberJoined($e) => $body,
            Self::MemberLeft($e) => $body,
            Self::LeaderAssigned($e) => $body,
            Self::GroupDissolved($e) => $body,
            Self::GroupRequestOpened($e) => $body,
        }
    };
}

impl DomainEvent for MarketplaceEvent {
    fn event_id(&self) -> EventId {
        dispatch!(self, e => e.event_id())
    }

    fn subject(&self) -> String {
        dispatch!(self, e => e.subject())
    }

    fn timestamp(&self) -> Timestamp {
        dispatch!(self, e => e.timestamp())
    }

    fn event_type(&self) -> EventType {
        dispatch!(self, e => e.event_type())
    }

    fn event_name(&self) -> &'static str {
        dispatch!(self, e => e.event_name())
    }
}

macro_rules! into_marketplace_event {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl From<$variant> for MarketplaceEvent {
                fn from(event: $variant) -> Self {
                    Self::$variant(event)
                }
            }
        )+
    };
}

into_marketplace_event!(
    RequestCreated,
    RequestClosed,
    RequestDeleted,
    OfferPlaced,
    OfferCountered,
    OfferRejected,
    OfferWithdrawn,
    ListingSettled,
    ListingExpired,
    GroupCreated,
    MemberJoined,
    MemberLeft,
    LeaderAssigned,
    GroupDissolved,
    GroupRequestOpened,
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{GroupId, UserId};

    #[test]
    fn wrapper_delegates_to_inner_event() {
        let inner = GroupDissolved {
            metadata: EventMetadata::default(),
            group_id: GroupId::new_v4(),
            last_member: UserId::new("leader"),
        };
        let event = MarketplaceEvent::from(inner.clone());
        assert_eq!(event.event_id(), inner.metadata.event_id);
        assert_eq!(event.event_name(), "GroupDissolved");
        assert_eq!(event.subject(), inner.group_id.to_string());
    }

    #[test]
    fn wrapper_is_tagged_on_the_wire() {
        let event = MarketplaceEvent::from(GroupDissolved {
            metadata: EventMetadata::default(),
            group_id: GroupId::new_v4(),
            last_member: UserId::new("leader"),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "group_dissolved");
        let back: MarketplaceEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
