//! # Listing Events
//!
//! Events for requests, group requests and the bids placed on them.
//!
//! # Event Flow
//!
//! ```text
//! RequestCreated | GroupRequestOpened
//!   -> OfferPlaced* -> OfferCountered* -> ListingSettled
//!
//! At any point: OfferRejected | OfferWithdrawn | ListingExpired | RequestClosed | RequestDeleted
//! ```

use crate::domain::entities::negotiation::NegotiationParty;
use crate::domain::events::domain_event::{
    BidRef, EventMetadata, EventType, ListingRef, impl_domain_event,
};
use crate::domain::value_objects::{Price, Quantity, RequestId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Event emitted when a vendor posts a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCreated {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The new request.
    pub request_id: RequestId,
    /// The vendor who posted it.
    pub owner_id: UserId,
    /// Requested item.
    pub item: String,
    /// Requested quantity.
    pub quantity: Quantity,
    /// Desired per-unit price.
    pub desired_price: Price,
    /// When the request expires.
    pub expires_at: Timestamp,
}

impl_domain_event!(RequestCreated, EventType::Listing, "RequestCreated", |e| e.request_id);

/// Event emitted when the owner closes a request early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestClosed {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The closed request.
    pub request_id: RequestId,
    /// Offers rejected by the close.
    pub rejected_offers: usize,
}

impl_domain_event!(RequestClosed, EventType::Listing, "RequestClosed", |e| e.request_id);

/// Event emitted when the owner deletes a request and its offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDeleted {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The deleted request.
    pub request_id: RequestId,
    /// Offers deleted with it.
    pub deleted_offers: usize,
}

impl_domain_event!(RequestDeleted, EventType::Listing, "RequestDeleted", |e| e.request_id);

/// Event emitted when a supplier places a bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferPlaced {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The listing bid on.
    pub listing: ListingRef,
    /// The new bid.
    pub bid: BidRef,
    /// The bidding supplier.
    pub supplier_id: UserId,
    /// Offered per-unit price.
    pub offered_price: Price,
}

impl_domain_event!(OfferPlaced, EventType::Negotiation, "OfferPlaced", |e| e.bid);

/// Event emitted when either side proposes new terms or agrees to a counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferCountered {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The listing.
    pub listing: ListingRef,
    /// The bid.
    pub bid: BidRef,
    /// Who moved.
    pub party: NegotiationParty,
    /// Per-unit price after the move.
    pub offered_price: Price,
}

impl_domain_event!(OfferCountered, EventType::Negotiation, "OfferCountered", |e| e.bid);

/// Event emitted when the owner rejects a bid directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRejected {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The listing.
    pub listing: ListingRef,
    /// The rejected bid.
    pub bid: BidRef,
}

impl_domain_event!(OfferRejected, EventType::Negotiation, "OfferRejected", |e| e.bid);

/// Event emitted when a supplier withdraws their own offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferWithdrawn {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The listing.
    pub listing: ListingRef,
    /// The withdrawn bid.
    pub bid: BidRef,
    /// The supplier who withdrew.
    pub supplier_id: UserId,
}

impl_domain_event!(OfferWithdrawn, EventType::Negotiation, "OfferWithdrawn", |e| e.bid);

/// Event emitted when an owner accepts a bid and every rival is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSettled {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The settled listing.
    pub listing: ListingRef,
    /// The winning bid.
    pub accepted: BidRef,
    /// Rivals rejected in the same write.
    pub rejected: Vec<BidRef>,
}

impl_domain_event!(ListingSettled, EventType::Settlement, "ListingSettled", |e| e.listing);

/// Event emitted when a listing times out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingExpired {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The expired listing.
    pub listing: ListingRef,
    /// Bids rejected in the same write.
    pub rejected_bids: usize,
}

impl_domain_event!(ListingExpired, EventType::Listing, "ListingExpired", |e| e.listing);
