use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MessagingError;

/// Named channel an event is published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    OrderCreated,
    OrderStatusUpdated,
    OrderCancelled,
    PaymentCompleted,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::OrderCreated,
        Topic::OrderStatusUpdated,
        Topic::OrderCancelled,
        Topic::PaymentCompleted,
    ];

    /// Returns the wire name of the topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::OrderCreated => "order-created",
            Topic::OrderStatusUpdated => "order-status-updated",
            Topic::OrderCancelled => "order-cancelled",
            Topic::PaymentCompleted => "payment-completed",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MessagingError::UnknownTopic(s.to_string()))
    }
}
