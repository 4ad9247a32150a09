//! # Domain Event Trait
//!
//! Base trait for all domain events.
//!
//! This module provides the [`DomainEvent`] trait that all domain events
//! must implement, along with common event metadata and the references
//! events use to point at listings and bids of either flavour.

use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{EventId, GroupOfferId, GroupRequestId, OfferId, RequestId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of domain event.
///
/// Categorizes events by their domain area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Listing lifecycle events.
    Listing,
    /// Offer negotiation events.
    Negotiation,
    /// Accept-one/reject-rest settlement.
    Settlement,
    /// Group membership events.
    Group,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing => write!(f, "LISTING"),
            Self::Negotiation => write!(f, "NEGOTIATION"),
            Self::Settlement => write!(f, "SETTLEMENT"),
            Self::Group => write!(f, "GROUP"),
        }
    }
}

/// Trait for all domain events.
///
/// Domain events are immutable records of something that happened to a
/// listing, bid or group.
pub trait DomainEvent: Send + Sync + fmt::Debug {
    /// Returns the unique identifier for this event.
    fn event_id(&self) -> EventId;

    /// Returns the id of the document the event is about.
    fn subject(&self) -> String;

    /// Returns when this event occurred.
    fn timestamp(&self) -> Timestamp;

    /// Returns the type/category of this event.
    fn event_type(&self) -> EventType;

    /// Returns the human-readable name of this event.
    fn event_name(&self) -> &'static str;
}

/// Common metadata for all domain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique identifier for this event.
    pub event_id: EventId,
    /// When this event occurred.
    pub timestamp: Timestamp,
}

impl EventMetadata {
    /// Creates metadata stamped at `timestamp` with a generated event ID.
    #[must_use]
    pub fn at(timestamp: Timestamp) -> Self {
        Self {
            event_id: EventId::new_v4(),
            timestamp,
        }
    }

    /// Creates event metadata with specific values (for reconstruction).
    #[must_use]
    pub fn from_parts(event_id: EventId, timestamp: Timestamp) -> Self {
        Self {
            event_id,
            timestamp,
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::at(Timestamp::now())
    }
}

/// Points at a request or a group request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ListingRef {
    /// An individual request.
    Request(RequestId),
    /// A group request.
    GroupRequest(GroupRequestId),
}

impl fmt::Display for ListingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(id) => write!(f, "request:{id}"),
            Self::GroupRequest(id) => write!(f, "group_request:{id}"),
        }
    }
}

impl From<RequestId> for ListingRef {
    fn from(id: RequestId) -> Self {
        Self::Request(id)
    }
}

impl From<GroupRequestId> for ListingRef {
    fn from(id: GroupRequestId) -> Self {
        Self::GroupRequest(id)
    }
}

/// Points at an offer or a group offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum BidRef {
    /// An offer on a request.
    Offer(OfferId),
    /// An offer on a group request.
    GroupOffer(GroupOfferId),
}

impl fmt::Display for BidRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offer(id) => write!(f, "offer:{id}"),
            Self::GroupOffer(id) => write!(f, "group_offer:{id}"),
        }
    }
}

impl From<OfferId> for BidRef {
    fn from(id: OfferId) -> Self {
        Self::Offer(id)
    }
}

impl From<GroupOfferId> for BidRef {
    fn from(id: GroupOfferId) -> Self {
        Self::GroupOffer(id)
    }
}

/// Implements [`DomainEvent`] for a struct with a `metadata` field.
macro_rules! impl_domain_event {
    ($ty:ty, $event_type:expr, $name:literal, |$e:ident| $subject:expr) => {
        impl $crate::domain::events::domain_event::DomainEvent for $ty {
            fn event_id(&self) -> $crate::domain::value_objects::EventId {
                self.metadata.event_id
            }

            fn subject(&self) -> String {
                let $e = self;
                $subject.to_string()
            }

            fn timestamp(&self) -> $crate::domain::value_objects::Timestamp {
                self.metadata.timestamp
            }

            fn event_type(&self) -> $crate::domain::events::domain_event::EventType {
                $event_type
            }

            fn event_name(&self) -> &'static str {
                $name
            }
        }
    };
}

pub(crate) use impl_domain_event;
