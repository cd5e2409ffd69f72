use async_trait::async_trait;
use common::{ProductId, StockId};

use crate::{NewStock, Result, StockRecord, StockUpdate};

/// Trait for stock ledger implementations.
///
/// `reserve` and `release` must be atomic with respect to each other for
/// the same record: two concurrent reservations can never both succeed if
/// together they exceed the available quantity.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Provisions a record for a product that has none yet.
    async fn create(&self, stock: NewStock) -> Result<StockRecord>;

    /// Loads a record by ID.
    async fn get(&self, id: StockId) -> Result<StockRecord>;

    /// Loads the record owned by a product.
    async fn get_by_product(&self, product_id: &ProductId) -> Result<StockRecord>;

    /// Lists all records in ID order.
    async fn list(&self) -> Result<Vec<StockRecord>>;

    /// Replaces the quantities and location of a record.
    async fn update(&self, id: StockId, update: StockUpdate) -> Result<StockRecord>;

    /// Removes a record.
    async fn delete(&self, id: StockId) -> Result<()>;

    /// Holds `quantity` units for an order.
    async fn reserve(&self, id: StockId, quantity: u32) -> Result<StockRecord>;

    /// Returns `quantity` previously held units.
    async fn release(&self, id: StockId, quantity: u32) -> Result<StockRecord>;
}
