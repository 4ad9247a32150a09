//! # Messaging
//!
//! Adapters for the [`EventPublisher`](crate::application::services::event_publisher::EventPublisher) port.

pub mod in_memory;

pub use in_memory::InMemoryEventPublisher;
