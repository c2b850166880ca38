//! In-process event publisher.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{EventPublisher, NotificationEvent, PublishError, RoutingAttributes};

/// Number of recent events kept for inspection
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub event: NotificationEvent,
    pub attributes: RoutingAttributes,
}

/// Records published events in a bounded in-memory log.
#[derive(Debug, Clone)]
pub struct MemoryEventPublisher {
    events: Arc<Mutex<VecDeque<PublishedEvent>>>,
    capacity: usize,
}

impl Default for MemoryEventPublisher {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)))),
            capacity: capacity.max(1),
        }
    }

    /// Snapshot of recorded events, oldest first.
    pub fn published(&self) -> Vec<PublishedEvent> {
        let events = self.events.lock().unwrap_or_else(|p| p.into_inner());
        events.iter().cloned().collect()
    }
}

#[async_trait]
impl EventPublisher for MemoryEventPublisher {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn publish(
        &self,
        event: &NotificationEvent,
        attributes: &RoutingAttributes,
    ) -> Result<(), PublishError> {
        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            provider = %event.provider,
            recipients = event.to.len(),
            attachments = event.attachment_ids.len(),
            "Notification event published"
        );

        let mut events = self.events.lock().unwrap_or_else(|p| p.into_inner());
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(PublishedEvent {
            event: event.clone(),
            attributes: attributes.clone(),
        });
        Ok(())
    }
}
