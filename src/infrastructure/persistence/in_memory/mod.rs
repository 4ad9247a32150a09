//! # In-Memory Repositories
//!
//! In-memory implementations for testing without database dependencies.
//!
//! [`InMemoryStore`] implements every repository port and the unit of work
//! over one set of tables, so batched writes are atomic across
//! collections.
//!
//! ## Thread Safety
//!
//! All tables sit behind one `Arc<RwLock<..>>`; clones share storage.

pub mod group_offer_repository;
pub mod group_repository;
pub mod group_request_repository;
pub mod offer_repository;
pub mod request_repository;
pub mod store;
pub mod unit_of_work;

pub use store::InMemoryStore;
