//! Payloads carried on each topic.

use chrono::Utc;
use common::OrderId;
use domain::Order;
use serde::{Deserialize, Serialize};

use crate::{EventEnvelope, Result, Topic};

/// Order lifecycle notification. Each variant carries the full order.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    Created(Order),
    StatusUpdated(Order),
    Cancelled(Order),
}

impl OrderEvent {
    pub fn topic(&self) -> Topic {
        match self {
            OrderEvent::Created(_) => Topic::OrderCreated,
            OrderEvent::StatusUpdated(_) => Topic::OrderStatusUpdated,
            OrderEvent::Cancelled(_) => Topic::OrderCancelled,
        }
    }

    pub fn order(&self) -> &Order {
        match self {
            OrderEvent::Created(order)
            | OrderEvent::StatusUpdated(order)
            | OrderEvent::Cancelled(order) => order,
        }
    }

    /// Encodes the event for publication, keyed by order ID.
    pub fn to_envelope(&self) -> Result<EventEnvelope> {
        let order = self.order();
        EventEnvelope::new(self.topic(), order.id().to_string(), order)
    }

    /// Decodes an order event, or `None` if the topic is not an order topic.
    pub fn from_envelope(envelope: &EventEnvelope) -> Result<Option<Self>> {
        let wrap = match envelope.topic {
            Topic::OrderCreated => OrderEvent::Created,
            Topic::OrderStatusUpdated => OrderEvent::StatusUpdated,
            Topic::OrderCancelled => OrderEvent::Cancelled,
            Topic::PaymentCompleted => return Ok(None),
        };
        Ok(Some(wrap(envelope.decode()?)))
    }
}

/// Outcome reported by the payment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Success,
    Failed,
}

/// Payload of `payment-completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCompleted {
    #[serde(alias = "orderId")]
    pub order_id: OrderId,
    pub status: PaymentStatus,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl PaymentCompleted {
    pub fn new(order_id: OrderId, status: PaymentStatus) -> Self {
        Self {
            order_id,
            status,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PaymentStatus::Success
    }

    pub fn to_envelope(&self) -> Result<EventEnvelope> {
        EventEnvelope::new(Topic::PaymentCompleted, self.order_id.to_string(), self)
    }
}
