//! Subscription runner that feeds events to handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::{EventEnvelope, Result, Topic};

/// Reacts to events on a fixed set of topics.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Returns the name of this handler, used in logs.
    fn name(&self) -> &'static str;

    /// Topics this handler wants to see.
    fn topics(&self) -> &[Topic];

    /// Applies one event.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;
}

/// Dispatches events from a subscription to registered handlers.
///
/// Errors never stop the consumer. A failing handler, an undecodable
/// payload or a lagged receiver is logged and the message is dropped.
#[derive(Default, Clone)]
pub struct EventConsumer {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler with this consumer.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Delivers one event to every interested handler.
    ///
    /// Returns how many handlers applied it successfully.
    #[tracing::instrument(skip(self, event), fields(topic = %event.topic, key = %event.key))]
    pub async fn dispatch(&self, event: &EventEnvelope) -> usize {
        let mut applied = 0;
        for handler in &self.handlers {
            if !handler.topics().contains(&event.topic) {
                continue;
            }
            match handler.handle(event).await {
                Ok(()) => applied += 1,
                Err(e) => {
                    tracing::error!(handler = handler.name(), error = %e, "Event handling failed, message dropped");
                }
            }
        }
        metrics::counter!("events_consumed_total", "topic" => event.topic.as_str()).increment(1);
        applied
    }

    /// Drains `receiver` until it closes or `shutdown` flips to true.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<EventEnvelope>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!(handlers = self.handlers.len(), "Event consumer started");
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        self.dispatch(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event consumer lagged, messages dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        tracing::info!("Event consumer stopped");
    }

    /// Runs the consumer on its own task.
    pub fn spawn(self, receiver: broadcast::Receiver<EventEnvelope>) -> ConsumerHandle {
        let (shutdown, signal) = watch::channel(false);
        let task = tokio::spawn(self.run(receiver, signal));
        ConsumerHandle { shutdown, task }
    }
}

/// Handle to a consumer task started with [`EventConsumer::spawn`].
pub struct ConsumerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ConsumerHandle {
    /// Signals the consumer to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Event consumer task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventBus, EventPublisher, MessagingError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingHandler {
        topics: Vec<Topic>,
        seen: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingHandler {
        fn new(topics: Vec<Topic>, fail: bool) -> (Arc<Self>, Arc<AtomicUsize>) {
            let seen = Arc::new(AtomicUsize::new(0));
            let handler = Arc::new(Self {
                topics,
                seen: Arc::clone(&seen),
                fail,
            });
            (handler, seen)
        }
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        fn name(&self) -> &'static str {
            "CountingHandler"
        }

        fn topics(&self) -> &[Topic] {
            &self.topics
        }

        async fn handle(&self, _event: &EventEnvelope) -> Result<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MessagingError::Handler {
                    handler: self.name(),
                    reason: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    fn event(topic: Topic) -> EventEnvelope {
        EventEnvelope::raw(topic, "1", serde_json::json!({}))
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_topic() {
        let (payments, payments_seen) = CountingHandler::new(vec![Topic::PaymentCompleted], false);
        let (orders, orders_seen) =
            CountingHandler::new(vec![Topic::OrderCreated, Topic::OrderCancelled], false);
        let consumer = EventConsumer::new()
            .with_handler(payments)
            .with_handler(orders);

        assert_eq!(consumer.dispatch(&event(Topic::OrderCreated)).await, 1);
        assert_eq!(consumer.dispatch(&event(Topic::PaymentCompleted)).await, 1);
        assert_eq!(consumer.dispatch(&event(Topic::OrderStatusUpdated)).await, 0);

        assert_eq!(payments_seen.load(Ordering::SeqCst), 1);
        assert_eq!(orders_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_block_others() {
        let (bad, bad_seen) = CountingHandler::new(vec![Topic::OrderCreated], true);
        let (good, good_seen) = CountingHandler::new(vec![Topic::OrderCreated], false);
        let consumer = EventConsumer::new().with_handler(bad).with_handler(good);

        assert_eq!(consumer.dispatch(&event(Topic::OrderCreated)).await, 1);
        assert_eq!(bad_seen.load(Ordering::SeqCst), 1);
        assert_eq!(good_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_spawned_consumer_drains_bus_and_stops() {
        let bus = EventBus::new(16);
        let (handler, seen) = CountingHandler::new(vec![Topic::OrderCreated], false);
        let handle = EventConsumer::new()
            .with_handler(handler)
            .spawn(bus.subscribe());

        for _ in 0..3 {
            bus.publish(event(Topic::OrderCreated)).await.unwrap();
        }

        for _ in 0..50 {
            if seen.load(Ordering::SeqCst) == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_consumer_survives_lag() {
        let bus = EventBus::new(2);
        let receiver = bus.subscribe();
        for _ in 0..5 {
            bus.publish(event(Topic::OrderCreated)).await.unwrap();
        }

        let (handler, seen) = CountingHandler::new(vec![Topic::OrderCreated], false);
        let handle = EventConsumer::new().with_handler(handler).spawn(receiver);

        for _ in 0..50 {
            if seen.load(Ordering::SeqCst) == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        handle.shutdown().await;
    }
}
