//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`RequestId`], [`OfferId`], [`GroupId`], [`GroupRequestId`], [`GroupOfferId`]: UUID-based identifiers
//! - [`UserId`]: Opaque user identifier
//! - [`EventId`]: Domain event identifier
//! - [`Actor`]: Authenticated caller with a [`Role`]
//!
//! ## Numeric Types
//!
//! - [`Price`]: Strictly positive decimal price
//! - [`Quantity`]: Parsed `<number><unit>` quantity string
//!
//! ## Lifecycles
//!
//! - [`OfferStatus`]: Negotiation state machine for offers and group offers
//! - [`RequestStatus`], [`GroupStatus`], [`GroupRequestStatus`]: Listing lifecycles

pub mod actor;
pub mod enums;
pub mod ids;
pub mod offer_status;
pub mod price;
pub mod quantity;
pub mod timestamp;

pub use actor::Actor;
pub use enums::{
    DeliveryPreference, GroupRequestStatus, GroupStatus, ParseEnumError, RequestStatus, Role,
    Urgency,
};
pub use ids::{EventId, GroupId, GroupOfferId, GroupRequestId, OfferId, RequestId, UserId};
pub use offer_status::OfferStatus;
pub use price::Price;
pub use quantity::Quantity;
pub use timestamp::Timestamp;
