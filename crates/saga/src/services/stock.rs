//! Stock service proxy.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{ProductId, StockId};
use ledger::{LedgerError, StockLedger, StockRecord};
use thiserror::Error;

use super::Lookup;

/// Failure of a reserve or release call.
#[derive(Debug, Error)]
pub enum StockCallError {
    /// The ledger answered and refused the mutation.
    #[error(transparent)]
    Rejected(LedgerError),

    /// The ledger could not be reached or failed internally.
    #[error("Stock service unavailable: {0}")]
    Unavailable(String),
}

impl From<LedgerError> for StockCallError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Store(store) => StockCallError::Unavailable(store.to_string()),
            other => StockCallError::Rejected(other),
        }
    }
}

/// Stock operations the order workflow depends on.
#[async_trait]
pub trait StockService: Send + Sync {
    async fn get_by_product(&self, product_id: &ProductId) -> Lookup<StockRecord>;

    async fn reserve(&self, id: StockId, quantity: u32) -> Result<StockRecord, StockCallError>;

    async fn release(&self, id: StockId, quantity: u32) -> Result<StockRecord, StockCallError>;
}

/// Exposes a [`StockLedger`] through the stock proxy.
#[derive(Clone)]
pub struct LedgerStockService {
    ledger: Arc<dyn StockLedger>,
    unavailable: Arc<AtomicBool>,
}

impl LedgerStockService {
    pub fn new(ledger: Arc<dyn StockLedger>) -> Self {
        Self {
            ledger,
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulates the Stock service being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), StockCallError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StockCallError::Unavailable(
                "stock service unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl StockService for LedgerStockService {
    async fn get_by_product(&self, product_id: &ProductId) -> Lookup<StockRecord> {
        if let Err(StockCallError::Unavailable(reason)) = self.check_reachable() {
            return Lookup::Unavailable(reason);
        }
        match self.ledger.get_by_product(product_id).await {
            Ok(record) => Lookup::Found(record),
            Err(LedgerError::ProductNotFound(_)) => Lookup::NotFound,
            Err(e) => Lookup::Unavailable(e.to_string()),
        }
    }

    async fn reserve(&self, id: StockId, quantity: u32) -> Result<StockRecord, StockCallError> {
        self.check_reachable()?;
        Ok(self.ledger.reserve(id, quantity).await?)
    }

    async fn release(&self, id: StockId, quantity: u32) -> Result<StockRecord, StockCallError> {
        self.check_reachable()?;
        Ok(self.ledger.release(id, quantity).await?)
    }
}
