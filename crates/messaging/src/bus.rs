use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{EventEnvelope, EventPublisher, Result};

/// In-process event bus backed by a broadcast channel.
///
/// Every subscriber sees every message published after it subscribed.
/// A subscriber that falls more than `capacity` messages behind loses
/// the oldest ones.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<()> {
        let topic = event.topic.as_str();
        let key = event.key.clone();
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(topic, key = %key, receivers, "Event published");
            }
            Err(_) => {
                // nobody listening is not a delivery failure
                tracing::debug!(topic, key = %key, "Event published with no subscribers");
            }
        }
        metrics::counter!("events_published_total", "topic" => topic).increment(1);
        Ok(())
    }
}
