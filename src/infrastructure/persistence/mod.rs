//! # Persistence Layer
//!
//! Repository ports and their adapters.
//!
//! ## Repository Traits (Ports)
//!
//! - [`RequestRepository`], [`OfferRepository`]: Individual listings and their bids
//! - [`GroupRepository`], [`GroupRequestRepository`], [`GroupOfferRepository`]: Group buying
//! - [`UnitOfWork`]: Atomic multi-document [`WriteBatch`] commits
//!
//! ## Implementations
//!
//! - `in_memory`: In-memory implementations for testing and the sweeper binary

pub mod in_memory;
pub mod query;
pub mod traits;

pub use in_memory::InMemoryStore;
pub use query::{GroupRequestQuery, ListingFilter, RequestQuery, Window};
pub use traits::{
    GroupOfferRepository, GroupRepository, GroupRequestRepository, OfferRepository,
    RepositoryError, RepositoryResult, RequestRepository, UnitOfWork, WriteBatch, WriteOp,
};
