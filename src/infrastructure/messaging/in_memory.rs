//! # In-Memory Event Publisher
//!
//! Keeps published events in order, for tests and for embedding the engine
//! without a broker.

use crate::application::error::ApplicationResult;
use crate::application::services::event_publisher::EventPublisher;
use crate::domain::events::{DomainEvent, MarketplaceEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Publisher that records every event.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    events: Arc<Mutex<Vec<MarketplaceEvent>>>,
}

impl InMemoryEventPublisher {
    /// Creates an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event published so far.
    #[must_use]
    pub fn events(&self) -> Vec<MarketplaceEvent> {
        self.events.lock().clone()
    }

    /// Returns the names of the events published so far, in order.
    #[must_use]
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.event_name()).collect()
    }

    /// Removes and returns every recorded event.
    pub fn drain(&self) -> Vec<MarketplaceEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: MarketplaceEvent) -> ApplicationResult<()> {
        self.events.lock().push(event);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::events::{EventMetadata, LeaderAssigned};
    use crate::domain::value_objects::{GroupId, UserId};

    #[tokio::test]
    async fn records_in_order_and_drains() {
        let publisher = InMemoryEventPublisher::new();
        let group_id = GroupId::new_v4();
        for leader in ["a", "b"] {
            publisher
                .publish(
                    LeaderAssigned {
                        metadata: EventMetadata::default(),
                        group_id,
                        previous_leader: UserId::new("x"),
                        new_leader: UserId::new(leader),
                    }
                    .into(),
                )
                .await
                .unwrap();
        }

        assert_eq!(publisher.len(), 2);
        assert_eq!(publisher.event_names(), vec!["LeaderAssigned", "LeaderAssigned"]);
        assert_eq!(publisher.drain().len(), 2);
        assert!(publisher.is_empty());
    }
}
