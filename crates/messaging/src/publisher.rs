use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{EventEnvelope, MessagingError, Result};

/// Outbound port for lifecycle events.
///
/// Callers treat a publish error as non-fatal: it is logged and the
/// operation that produced the event still succeeds.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: EventEnvelope) -> Result<()>;
}

/// Publisher that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, _event: EventEnvelope) -> Result<()> {
        Ok(())
    }
}

/// Publisher whose transport is always down.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<()> {
        Err(MessagingError::Publish(format!(
            "broker unreachable for {}",
            event.topic
        )))
    }
}

/// Publisher that keeps every event it is given, for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<EventEnvelope>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything published so far.
    pub fn published(&self) -> Vec<EventEnvelope> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| MessagingError::Publish("recorder poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}
