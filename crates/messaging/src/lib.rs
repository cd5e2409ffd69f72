//! Event fan-out for the order lifecycle.
//!
//! - [`EventPublisher`] is the outbound port; [`EventBus`] implements it on
//!   top of a tokio broadcast channel
//! - [`EventConsumer`] drains a subscription on its own task and dispatches
//!   each message by [`Topic`] to the registered [`EventHandler`]s
//!
//! Delivery is at-most-once: nothing is persisted, retried or dead-lettered.

pub mod bus;
pub mod consumer;
pub mod envelope;
pub mod error;
pub mod events;
pub mod logger;
pub mod publisher;
pub mod topic;

pub use bus::EventBus;
pub use consumer::{ConsumerHandle, EventConsumer, EventHandler};
pub use envelope::{EventEnvelope, EventId};
pub use error::{MessagingError, Result};
pub use events::{OrderEvent, PaymentCompleted, PaymentStatus};
pub use logger::OrderEventLogger;
pub use publisher::{EventPublisher, FailingPublisher, NoopPublisher, RecordingPublisher};
pub use topic::Topic;
