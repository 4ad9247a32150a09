//! # Procurement Engine
//!
//! Negotiation state machine and demand aggregation for a two-sided
//! procurement marketplace. Vendors post requests for goods, suppliers bid
//! on them, and vendors may pool demand into buying groups whose leader
//! negotiates one group request on everyone's behalf.
//!
//! # Architecture
//!
//! - [`domain`]: Entities, value objects, the negotiation engine and events
//! - [`application`]: Services that load, mutate and commit aggregates
//! - [`infrastructure`]: Repository ports, the in-memory store and logging
//! - [`config`]: Layered settings
//!
//! Every write goes through an optimistic version check. Services retry a
//! bounded number of times on a version conflict and then surface
//! [`ApplicationError::Conflict`](application::ApplicationError::Conflict).

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
