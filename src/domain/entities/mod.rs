//! # Domain Entities
//!
//! Aggregate roots and entities representing core business concepts.
//!
//! ## Listings
//!
//! - [`Request`]: Individual vendor request
//! - [`Group`]: Buying group pooling member quantities
//! - [`GroupRequest`]: The pooled request a group leader opens
//!
//! ## Bids
//!
//! - [`Offer`]: Supplier offer on a request
//! - [`GroupOffer`]: Supplier offer on a group request, with negotiation log
//!
//! ## Negotiation
//!
//! - [`Listing`], [`Bid`]: Traits the negotiation engine is generic over

pub mod group;
pub mod group_offer;
pub mod group_request;
pub mod negotiation;
pub mod offer;
pub mod request;

pub use group::{DEFAULT_MAX_MEMBERS, Group, GroupBuilder, GroupMember, LeaveOutcome};
pub use group_offer::GroupOffer;
pub use group_request::{GroupListing, GroupRequest};
pub use negotiation::{
    Bid, Listing, NegotiationAction, NegotiationEntry, NegotiationParty, NegotiationStep,
    TermsUpdate,
};
pub use offer::{DeliveryOptions, Offer, OfferTerms};
pub use request::{Request, RequestBuilder, RequestChanges};
