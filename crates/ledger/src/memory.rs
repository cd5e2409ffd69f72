use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::{ProductId, StockId};
use store::{InMemorySequenceGenerator, STOCK_SEQUENCE, SequenceGenerator};
use tokio::sync::{Mutex, RwLock};

use crate::{LedgerError, NewStock, Result, StockLedger, StockRecord, StockUpdate};

type Slot = Arc<Mutex<StockRecord>>;

/// In-memory stock ledger.
///
/// Records live in an arena keyed by ID, each behind its own mutex, so
/// reservations against different products never contend. The product
/// index is write-locked for the whole of `create` and `delete`, which is
/// what keeps product IDs unique.
#[derive(Clone)]
pub struct InMemoryStockLedger {
    records: Arc<RwLock<BTreeMap<StockId, Slot>>>,
    by_product: Arc<RwLock<HashMap<ProductId, StockId>>>,
    sequences: Arc<dyn SequenceGenerator>,
}

impl Default for InMemoryStockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStockLedger {
    /// Creates an empty ledger with its own ID counter.
    pub fn new() -> Self {
        Self::with_sequences(Arc::new(InMemorySequenceGenerator::new()))
    }

    /// Creates an empty ledger drawing IDs from a shared generator.
    pub fn with_sequences(sequences: Arc<dyn SequenceGenerator>) -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            by_product: Arc::new(RwLock::new(HashMap::new())),
            sequences,
        }
    }

    /// Returns the number of records.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    async fn slot(&self, id: StockId) -> Result<Slot> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(LedgerError::StockNotFound(id))
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn create(&self, stock: NewStock) -> Result<StockRecord> {
        stock.validate()?;

        let mut by_product = self.by_product.write().await;
        if by_product.contains_key(&stock.product_id) {
            return Err(LedgerError::DuplicateStock(stock.product_id));
        }

        let id = StockId::new(self.sequences.next_value(STOCK_SEQUENCE).await?);
        let record = stock.into_record(id);

        by_product.insert(record.product_id.clone(), id);
        self.records
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(record.clone())));

        tracing::info!(stock_id = %id, product_id = %record.product_id, quantity = record.quantity, "Stock record created");
        Ok(record)
    }

    async fn get(&self, id: StockId) -> Result<StockRecord> {
        let slot = self.slot(id).await?;
        let record = slot.lock().await.clone();
        Ok(record)
    }

    async fn get_by_product(&self, product_id: &ProductId) -> Result<StockRecord> {
        let id = self
            .by_product
            .read()
            .await
            .get(product_id)
            .copied()
            .ok_or_else(|| LedgerError::ProductNotFound(product_id.clone()))?;
        self.get(id).await
    }

    async fn list(&self) -> Result<Vec<StockRecord>> {
        let slots: Vec<Slot> = self.records.read().await.values().cloned().collect();
        let mut records = Vec::with_capacity(slots.len());
        for slot in slots {
            records.push(slot.lock().await.clone());
        }
        Ok(records)
    }

    async fn update(&self, id: StockId, update: StockUpdate) -> Result<StockRecord> {
        update.validate()?;
        let slot = self.slot(id).await?;
        let mut record = slot.lock().await;
        update.apply(&mut record);
        tracing::info!(stock_id = %id, quantity = record.quantity, reserved = record.reserved_quantity, "Stock record updated");
        Ok(record.clone())
    }

    async fn delete(&self, id: StockId) -> Result<()> {
        let mut by_product = self.by_product.write().await;
        let slot = self
            .records
            .write()
            .await
            .remove(&id)
            .ok_or(LedgerError::StockNotFound(id))?;
        let product_id = slot.lock().await.product_id.clone();
        by_product.remove(&product_id);
        tracing::info!(stock_id = %id, product_id = %product_id, "Stock record deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn reserve(&self, id: StockId, quantity: u32) -> Result<StockRecord> {
        let slot = self.slot(id).await?;
        let mut record = slot.lock().await;
        match record.reserve(quantity) {
            Ok(()) => {
                metrics::counter!("stock_reservations_total").increment(1);
                tracing::debug!(available = record.available_quantity(), "Stock reserved");
                Ok(record.clone())
            }
            Err(e) => {
                metrics::counter!("stock_reservation_rejections_total").increment(1);
                tracing::warn!(error = %e, "Reservation rejected");
                Err(e)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn release(&self, id: StockId, quantity: u32) -> Result<StockRecord> {
        let slot = self.slot(id).await?;
        let mut record = slot.lock().await;
        record.release(quantity)?;
        metrics::counter!("stock_releases_total").increment(1);
        tracing::debug!(available = record.available_quantity(), "Stock released");
        Ok(record.clone())
    }
}
