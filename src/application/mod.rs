//! # Application Layer
//!
//! Use cases over the domain model: every operation takes the calling
//! [`Actor`](crate::domain::value_objects::Actor), loads what it needs
//! through the persistence ports, applies domain rules and commits.

pub mod error;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
