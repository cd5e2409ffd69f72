//! Payment mock and the consumers that connect payments to orders.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderStatus};
use messaging::{
    EventEnvelope, EventHandler, EventPublisher, MessagingError, OrderEvent, PaymentCompleted,
    PaymentStatus, Topic,
};

use crate::OrderWorkflow;

/// Stand-in for the payment provider.
///
/// Every call reports its outcome on `payment-completed`. The outcome is
/// fixed by [`set_approve`](Self::set_approve) and defaults to success.
#[derive(Clone)]
pub struct PaymentProcessor {
    publisher: Arc<dyn EventPublisher>,
    approve: Arc<AtomicBool>,
}

impl PaymentProcessor {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            publisher,
            approve: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_approve(&self, approve: bool) {
        self.approve.store(approve, Ordering::SeqCst);
    }

    /// Charges an order and announces the result. Returns whether it succeeded.
    #[tracing::instrument(skip(self))]
    pub async fn process(&self, order_id: OrderId) -> bool {
        let approved = self.approve.load(Ordering::SeqCst);
        let status = if approved {
            tracing::info!("Payment approved");
            PaymentStatus::Success
        } else {
            tracing::warn!("Payment declined");
            PaymentStatus::Failed
        };

        let outcome = match PaymentCompleted::new(order_id, status).to_envelope() {
            Ok(envelope) => self.publisher.publish(envelope).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            metrics::counter!("event_publish_failures_total", "topic" => Topic::PaymentCompleted.as_str())
                .increment(1);
            tracing::error!(error = %e, "Failed to publish payment result");
        }

        approved
    }
}

/// Applies `payment-completed` events to orders.
///
/// A successful payment moves the order to `Paid`. A failed payment is
/// only logged; the order and its reservations stay as they are.
pub struct PaymentCompletedHandler {
    workflow: OrderWorkflow,
}

impl PaymentCompletedHandler {
    pub fn new(workflow: OrderWorkflow) -> Self {
        Self { workflow }
    }
}

#[async_trait]
impl EventHandler for PaymentCompletedHandler {
    fn name(&self) -> &'static str {
        "PaymentCompletedHandler"
    }

    fn topics(&self) -> &[Topic] {
        &[Topic::PaymentCompleted]
    }

    async fn handle(&self, event: &EventEnvelope) -> messaging::Result<()> {
        let payment: PaymentCompleted = event.decode()?;

        if !payment.is_success() {
            tracing::warn!(order_id = %payment.order_id, "Payment failed, order left unchanged");
            return Ok(());
        }

        self.workflow
            .set_order_status(payment.order_id, OrderStatus::Paid)
            .await
            .map(|order: Order| {
                tracing::info!(order_id = %order.id(), "Order marked as paid");
            })
            .map_err(|e| MessagingError::Handler {
                handler: self.name(),
                reason: e.to_string(),
            })
    }
}

/// Charges every newly created order.
pub struct AutoPaymentHandler {
    processor: PaymentProcessor,
    delay: Duration,
}

impl AutoPaymentHandler {
    pub fn new(processor: PaymentProcessor) -> Self {
        Self {
            processor,
            delay: Duration::ZERO,
        }
    }

    /// Waits this long before charging, to mimic provider latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl EventHandler for AutoPaymentHandler {
    fn name(&self) -> &'static str {
        "AutoPaymentHandler"
    }

    fn topics(&self) -> &[Topic] {
        &[Topic::OrderCreated]
    }

    async fn handle(&self, event: &EventEnvelope) -> messaging::Result<()> {
        let Some(OrderEvent::Created(order)) = OrderEvent::from_envelope(event)? else {
            return Ok(());
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.processor.process(order.id()).await;
        Ok(())
    }
}
