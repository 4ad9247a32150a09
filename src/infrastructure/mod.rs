//! # Infrastructure Layer
//!
//! Adapters behind the application ports.
//!
//! - [`persistence`]: Repository ports and the in-memory store
//! - [`messaging`]: Event publisher adapters
//! - [`telemetry`]: Logging setup

pub mod messaging;
pub mod persistence;
pub mod telemetry;
