use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::Order;
use tokio::sync::RwLock;

use crate::{OrderRepository, Result, SequenceGenerator, StoreError};

/// In-memory order repository for testing and local runs.
///
/// Orders are kept in identifier order, which is also creation order.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<BTreeMap<OrderId, Order>>>,
    fail_on_save: Arc<AtomicBool>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `save` fail until switched off again.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<()> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("order storage is offline".to_string()));
        }
        self.orders.write().await.insert(order.id(), order.clone());
        metrics::counter!("order_writes_total").increment(1);
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Order>> {
        Ok(self.orders.read().await.values().cloned().collect())
    }
}

/// In-memory sequence generator.
///
/// Each named counter is an `AtomicI64`; allocation is a single
/// `fetch_add`, so concurrent callers never observe the same value.
#[derive(Clone, Default)]
pub struct InMemorySequenceGenerator {
    counters: Arc<RwLock<HashMap<String, Arc<AtomicI64>>>>,
}

impl InMemorySequenceGenerator {
    /// Creates a generator with no counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last value handed out for a counter, or 0 if unused.
    pub async fn current_value(&self, name: &str) -> i64 {
        self.counters
            .read()
            .await
            .get(name)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    async fn counter(&self, name: &str) -> Arc<AtomicI64> {
        if let Some(counter) = self.counters.read().await.get(name) {
            return Arc::clone(counter);
        }
        let mut counters = self.counters.write().await;
        Arc::clone(counters.entry(name.to_string()).or_default())
    }
}

#[async_trait]
impl SequenceGenerator for InMemorySequenceGenerator {
    async fn next_value(&self, name: &str) -> Result<i64> {
        let counter = self.counter(name).await;
        Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
