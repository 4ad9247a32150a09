//! # Event Publisher
//!
//! Port through which services announce committed state changes.
//!
//! Events are published after the write they describe has committed. A
//! publishing failure is logged and does not undo the write.

use crate::application::error::ApplicationResult;
use crate::domain::events::{DomainEvent, MarketplaceEvent};
use async_trait::async_trait;
use std::fmt;

/// Sink for marketplace events.
#[async_trait]
pub trait EventPublisher: Send + Sync + fmt::Debug {
    /// Publishes one event.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::EventPublishError` if the sink rejects it.
    async fn publish(&self, event: MarketplaceEvent) -> ApplicationResult<()>;
}

/// Publisher that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPublisher;

#[async_trait]
impl EventPublisher for LoggingPublisher {
    async fn publish(&self, event: MarketplaceEvent) -> ApplicationResult<()> {
        tracing::debug!(
            event = event.event_name(),
            subject = %event.subject(),
            "domain event"
        );
        Ok(())
    }
}
