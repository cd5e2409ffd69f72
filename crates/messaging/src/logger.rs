use async_trait::async_trait;

use crate::{EventEnvelope, EventHandler, OrderEvent, Result, Topic};

/// Logs the informational order topics.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderEventLogger;

const ORDER_TOPICS: [Topic; 3] = [
    Topic::OrderCreated,
    Topic::OrderStatusUpdated,
    Topic::OrderCancelled,
];

#[async_trait]
impl EventHandler for OrderEventLogger {
    fn name(&self) -> &'static str {
        "OrderEventLogger"
    }

    fn topics(&self) -> &[Topic] {
        &ORDER_TOPICS
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if let Some(order_event) = OrderEvent::from_envelope(event)? {
            let order = order_event.order();
            tracing::info!(
                topic = %event.topic,
                order_id = %order.id(),
                user_id = %order.user_id(),
                status = %order.status(),
                total = %order.total_amount(),
                "Order event received"
            );
        }
        Ok(())
    }
}
