//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! This module provides:
//! - [`ListingService`]: Request lifecycle and listing queries
//! - [`NegotiationService`]: Placing, countering and rejecting bids
//! - [`SettlementCoordinator`]: Accepting a bid and settling its listing
//! - [`MembershipService`]: Buying groups and their group request
//! - [`ExpirationSweeper`]: Periodic expiry of overdue listings
//! - [`Marketplace`]: All of the above over one [`MarketplaceContext`]
//!
//! Supporting pieces: [`Clock`], [`EventPublisher`], [`RetryPolicy`] and
//! page handling.

pub mod clock;
pub mod context;
pub mod event_publisher;
pub mod expiration;
pub mod listing;
pub mod marketplace;
pub mod membership;
pub mod negotiation;
pub mod pagination;
pub mod retry;
pub mod settlement;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{MarketplaceContext, Repositories};
pub use event_publisher::{EventPublisher, LoggingPublisher};
pub use expiration::{ExpirationSweeper, SweepReport};
pub use listing::{ListingService, NewRequest, RequestStats, RequestUpdate};
pub use marketplace::Marketplace;
pub use membership::{MembershipService, NewGroup};
pub use negotiation::NegotiationService;
pub use pagination::{Page, PageParams, PaginationMeta, ResolvedPage};
pub use retry::RetryPolicy;
pub use settlement::{Settlement, SettlementCoordinator};
