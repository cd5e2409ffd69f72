//! Order workflow coordinator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use common::{OrderId, UserId};
use domain::{Order, OrderItem, OrderRequest, OrderStatus, TransitionPolicy};
use ledger::LedgerError;
use messaging::{EventPublisher, OrderEvent};
use store::{ORDER_SEQUENCE, OrderRepository, SequenceGenerator};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{Resource, Result, WorkflowError};
use crate::reservation::{Reservation, ReservationLog};
use crate::services::{Lookup, ProductCatalog, StockCallError, StockService, UserDirectory};

/// Behaviour switches for [`OrderWorkflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Release earlier reservations when a later creation step fails.
    pub compensate_partial_reservations: bool,
    /// How direct status updates consult the transition table.
    pub transition_policy: TransitionPolicy,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            compensate_partial_reservations: true,
            transition_policy: TransitionPolicy::Strict,
        }
    }
}

impl WorkflowConfig {
    /// Reproduces the historical behaviour: no compensation on partial
    /// failure and no transition checks on direct updates.
    pub fn legacy() -> Self {
        Self {
            compensate_partial_reservations: false,
            transition_policy: TransitionPolicy::Permissive,
        }
    }
}

/// One mutex per order, so status changes to the same order never interleave.
#[derive(Clone, Default)]
struct OrderLocks {
    slots: Arc<Mutex<HashMap<OrderId, Arc<Mutex<()>>>>>,
}

impl OrderLocks {
    async fn acquire(&self, id: OrderId) -> OwnedMutexGuard<()> {
        let slot = self.slots.lock().await.entry(id).or_default().clone();
        slot.lock_owned().await
    }
}

/// Orchestrates order creation, status updates and cancellation.
///
/// Creation is a sequence of remote steps (buyer check, pricing, stock
/// reservation) followed by the durable write, which is the commit point.
/// Items are reserved strictly in request order. Events are published
/// after the write and a publish failure never fails the operation.
///
/// Status updates and cancellations of one order are serialized: each holds
/// that order's lock from the read through the write, so a second caller
/// sees the first caller's result.
#[derive(Clone)]
pub struct OrderWorkflow {
    orders: Arc<dyn OrderRepository>,
    sequences: Arc<dyn SequenceGenerator>,
    users: Arc<dyn UserDirectory>,
    products: Arc<dyn ProductCatalog>,
    stock: Arc<dyn StockService>,
    publisher: Arc<dyn EventPublisher>,
    config: WorkflowConfig,
    locks: OrderLocks,
}

impl OrderWorkflow {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        sequences: Arc<dyn SequenceGenerator>,
        users: Arc<dyn UserDirectory>,
        products: Arc<dyn ProductCatalog>,
        stock: Arc<dyn StockService>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            orders,
            sequences,
            users,
            products,
            stock,
            publisher,
            config: WorkflowConfig::default(),
            locks: OrderLocks::default(),
        }
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> WorkflowConfig {
        self.config
    }

    /// Places an order: validates the buyer, prices and reserves every item,
    /// persists the order and publishes `order-created`.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id, items = request.items.len()))]
    pub async fn create_order(&self, request: OrderRequest) -> Result<Order> {
        let started = std::time::Instant::now();
        let result = self.try_create_order(request).await;

        metrics::histogram!("order_creation_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(order_id = %order.id(), total = %order.total_amount(), "Order created");
            }
            Err(e) => {
                metrics::counter!("order_creation_failures_total", "reason" => e.kind())
                    .increment(1);
                tracing::warn!(error = %e, "Order creation failed");
            }
        }
        result
    }

    async fn try_create_order(&self, request: OrderRequest) -> Result<Order> {
        request
            .validate()
            .map_err(|e| WorkflowError::Validation(e.to_string()))?;

        let order_id = OrderId::new(self.sequences.next_value(ORDER_SEQUENCE).await?);

        match self.users.get_user(request.user_id).await {
            Lookup::Found(_) => {}
            Lookup::NotFound => return Err(WorkflowError::not_found(Resource::User, request.user_id)),
            Lookup::Unavailable(reason) => {
                return Err(WorkflowError::unavailable(Resource::User, reason));
            }
        }

        let mut log = ReservationLog::new();
        let placed = match self.reserve_items(&request, &mut log).await {
            Ok(items) => Order::place(
                order_id,
                request.user_id,
                items,
                request.shipping_address,
                Utc::now(),
            )
            .map_err(|e| WorkflowError::from_order(order_id, e)),
            Err(e) => Err(e),
        };

        let persisted = match placed {
            Ok(order) => self.orders.save(&order).await.map(|()| order).map_err(WorkflowError::from),
            Err(e) => Err(e),
        };

        let order = match persisted {
            Ok(order) => {
                log.commit();
                order
            }
            Err(e) => {
                self.unwind(&mut log).await;
                return Err(e);
            }
        };

        self.publish(OrderEvent::Created(order.clone())).await;
        Ok(order)
    }

    /// Prices and reserves each line in request order.
    async fn reserve_items(
        &self,
        request: &OrderRequest,
        log: &mut ReservationLog,
    ) -> Result<Vec<OrderItem>> {
        let mut items = Vec::with_capacity(request.items.len());

        for line in &request.items {
            let product = match self.products.get_product(&line.product_id).await {
                Lookup::Found(product) => product,
                Lookup::NotFound => {
                    return Err(WorkflowError::not_found(Resource::Product, &line.product_id));
                }
                Lookup::Unavailable(reason) => {
                    return Err(WorkflowError::unavailable(Resource::Product, reason));
                }
            };

            let stock = match self.stock.get_by_product(&line.product_id).await {
                Lookup::Found(stock) => stock,
                Lookup::NotFound => {
                    return Err(WorkflowError::not_found(Resource::Stock, &line.product_id));
                }
                Lookup::Unavailable(reason) => {
                    return Err(WorkflowError::unavailable(Resource::Stock, reason));
                }
            };

            let available = stock.available_quantity();
            if available < line.quantity {
                return Err(WorkflowError::InsufficientStock {
                    product_name: product.name,
                    available,
                    requested: line.quantity,
                });
            }

            match self.stock.reserve(stock.id, line.quantity).await {
                Ok(_) => {}
                // lost a race with another order after the availability check
                Err(StockCallError::Rejected(LedgerError::InsufficientStock {
                    available,
                    requested,
                    ..
                })) => {
                    return Err(WorkflowError::InsufficientStock {
                        product_name: product.name,
                        available,
                        requested,
                    });
                }
                Err(e) => return Err(WorkflowError::unavailable(Resource::Stock, e.to_string())),
            }

            tracing::debug!(product_id = %line.product_id, stock_id = %stock.id, quantity = line.quantity, "Item reserved");
            log.record(Reservation {
                stock_id: stock.id,
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            });

            items.push(OrderItem::new(
                line.product_id.clone(),
                product.name,
                line.quantity,
                product.price,
            ));
        }

        Ok(items)
    }

    async fn unwind(&self, log: &mut ReservationLog) {
        if self.config.compensate_partial_reservations {
            let failures = log.compensate(self.stock.as_ref()).await;
            if failures > 0 {
                tracing::error!(failures, "Compensation left reservations in place");
            }
        } else {
            log.abandon();
        }
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(Resource::Order, id))
    }

    pub async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.orders.find_by_user(user_id).await?)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.orders.find_all().await?)
    }

    /// Sets the status named by `status` (case-insensitive).
    pub async fn update_order_status(&self, id: OrderId, status: &str) -> Result<Order> {
        let next: OrderStatus = status
            .parse()
            .map_err(|e| WorkflowError::from_order(id, e))?;
        self.set_order_status(id, next).await
    }

    /// Moves an order to `next` and publishes `order-status-updated`.
    ///
    /// Under the strict policy a move to `Cancelled` goes through
    /// [`cancel_order`](Self::cancel_order) so reserved stock is released.
    #[tracing::instrument(skip_all, fields(order_id = %id, status = %next))]
    pub async fn set_order_status(&self, id: OrderId, next: OrderStatus) -> Result<Order> {
        let _guard = self.locks.acquire(id).await;
        if next == OrderStatus::Cancelled && self.config.transition_policy == TransitionPolicy::Strict
        {
            return self.cancel_locked(id).await;
        }

        let mut order = self.get_order(id).await?;
        let previous = order
            .transition_to(next, self.config.transition_policy, Utc::now())
            .map_err(|e| WorkflowError::from_order(id, e))?;
        self.orders.save(&order).await?;

        tracing::info!(from = %previous, to = %next, "Order status updated");
        self.publish(OrderEvent::StatusUpdated(order.clone())).await;
        Ok(order)
    }

    /// Cancels an order, releasing its reservations if it is still
    /// pending or confirmed.
    ///
    /// Cancelling a cancelled order is a no-op. Individual release failures
    /// are logged and do not stop the cancellation.
    #[tracing::instrument(skip_all, fields(order_id = %id))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<Order> {
        let _guard = self.locks.acquire(id).await;
        self.cancel_locked(id).await
    }

    /// Caller must hold the order's lock.
    async fn cancel_locked(&self, id: OrderId) -> Result<Order> {
        let mut order = self.get_order(id).await?;
        if order.status() == OrderStatus::Cancelled {
            tracing::debug!("Order already cancelled");
            return Ok(order);
        }

        let previous = order
            .cancel(Utc::now())
            .map_err(|e| WorkflowError::from_order(id, e))?;

        if previous.releases_stock_on_cancel() {
            self.release_items(&order).await;
        }

        self.orders.save(&order).await?;
        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(from = %previous, "Order cancelled");

        self.publish(OrderEvent::Cancelled(order.clone())).await;
        Ok(order)
    }

    async fn release_items(&self, order: &Order) {
        for item in order.items() {
            let stock = match self.stock.get_by_product(&item.product_id).await {
                Lookup::Found(stock) => stock,
                Lookup::NotFound => {
                    tracing::warn!(product_id = %item.product_id, "No stock record to release against");
                    continue;
                }
                Lookup::Unavailable(reason) => {
                    tracing::error!(product_id = %item.product_id, %reason, "Stock service unavailable during release");
                    continue;
                }
            };

            if let Err(e) = self.stock.release(stock.id, item.quantity).await {
                tracing::error!(
                    product_id = %item.product_id,
                    stock_id = %stock.id,
                    quantity = item.quantity,
                    error = %e,
                    "Failed to release stock for cancelled order"
                );
            }
        }
    }

    async fn publish(&self, event: OrderEvent) {
        let topic = event.topic();
        let order_id = event.order().id();
        let outcome = match event.to_envelope() {
            Ok(envelope) => self.publisher.publish(envelope).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            metrics::counter!("event_publish_failures_total", "topic" => topic.as_str())
                .increment(1);
            tracing::error!(%topic, %order_id, error = %e, "Failed to publish order event");
        }
    }
}
