//! # Domain Services
//!
//! Domain services encapsulating business logic that doesn't naturally
//! belong to a single entity or value object.
//!
//! ## Services
//!
//! - [`negotiation::NegotiationEngine`]: Counter/respond/accept/reject rules for any listing and bid
//! - [`quantity_aggregation::QuantityAggregator`]: Pooled quantity of a buying group

pub mod negotiation;
pub mod quantity_aggregation;

pub use negotiation::{CounterResponse, NegotiationEngine};
pub use quantity_aggregation::QuantityAggregator;
