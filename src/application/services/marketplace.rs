//! # Marketplace
//!
//! Wires the services over one shared context.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::application::services::marketplace::Marketplace;
//! use procurement_engine::application::services::listing::NewRequest;
//! use procurement_engine::config::MarketplaceConfig;
//! use procurement_engine::domain::value_objects::Actor;
//!
//! # tokio_test::block_on(async {
//! let market = Marketplace::in_memory(MarketplaceConfig::default());
//! let vendor = Actor::vendor("vendor-1");
//! let request = market
//!     .listings()
//!     .create_request(&vendor, NewRequest::new("Rice", "50kg", 40, "Delhi"))
//!     .await
//!     .unwrap();
//! assert_eq!(request.item(), "Rice");
//! # });
//! ```

use crate::application::services::context::{MarketplaceContext, Repositories};
use crate::application::services::expiration::ExpirationSweeper;
use crate::application::services::listing::ListingService;
use crate::application::services::membership::MembershipService;
use crate::application::services::negotiation::NegotiationService;
use crate::application::services::settlement::SettlementCoordinator;
use crate::config::MarketplaceConfig;
use crate::infrastructure::persistence::InMemoryStore;
use std::sync::Arc;

/// Every marketplace service.
#[derive(Debug, Clone)]
pub struct Marketplace {
    ctx: Arc<MarketplaceContext>,
    listings: ListingService,
    negotiation: NegotiationService,
    settlement: SettlementCoordinator,
    membership: MembershipService,
}

impl Marketplace {
    /// Builds the services over `ctx`.
    #[must_use]
    pub fn new(ctx: MarketplaceContext) -> Self {
        let ctx = Arc::new(ctx);
        Self {
            listings: ListingService::new(ctx.clone()),
            negotiation: NegotiationService::new(ctx.clone()),
            settlement: SettlementCoordinator::new(ctx.clone()),
            membership: MembershipService::new(ctx.clone()),
            ctx,
        }
    }

    /// Builds the services over a fresh in-memory store.
    #[must_use]
    pub fn in_memory(config: MarketplaceConfig) -> Self {
        let repos = Repositories::in_memory(InMemoryStore::new());
        Self::new(MarketplaceContext::new(repos, config))
    }

    /// Returns the shared context.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &MarketplaceContext {
        &self.ctx
    }

    /// Request lifecycle and listing queries.
    #[inline]
    #[must_use]
    pub fn listings(&self) -> &ListingService {
        &self.listings
    }

    /// Bids short of acceptance.
    #[inline]
    #[must_use]
    pub fn negotiation(&self) -> &NegotiationService {
        &self.negotiation
    }

    /// Accepting bids.
    #[inline]
    #[must_use]
    pub fn settlement(&self) -> &SettlementCoordinator {
        &self.settlement
    }

    /// Buying groups.
    #[inline]
    #[must_use]
    pub fn membership(&self) -> &MembershipService {
        &self.membership
    }

    /// Creates a sweeper over the same context.
    #[must_use]
    pub fn sweeper(&self) -> ExpirationSweeper {
        ExpirationSweeper::new(self.ctx.clone())
    }
}
