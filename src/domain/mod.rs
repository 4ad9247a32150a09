//! # Domain Layer
//!
//! Marketplace business rules, free of storage and transport concerns.
//!
//! - [`value_objects`]: Identifiers, prices, quantities and status enums
//! - [`entities`]: Requests, offers, groups, group requests and group offers
//! - [`services`]: Negotiation engine and quantity aggregation
//! - [`events`]: Domain events emitted by the application layer
//! - [`errors`]: [`DomainError`](errors::DomainError) and the failure taxonomy

pub mod entities;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;
