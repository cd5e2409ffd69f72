use common::{ProductId, StockId};
use store::StoreError;
use thiserror::Error;

/// Errors raised by the stock ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No stock record has this ID.
    #[error("Stock not found: {0}")]
    StockNotFound(StockId),

    /// No stock record exists for this product.
    #[error("Stock not found for product: {0}")]
    ProductNotFound(ProductId),

    /// A stock record already exists for this product.
    #[error("Stock record already exists for product: {0}")]
    DuplicateStock(ProductId),

    /// The requested reservation exceeds the available quantity.
    #[error("Insufficient stock for {stock_id}: available {available}, requested {requested}")]
    InsufficientStock {
        stock_id: StockId,
        available: u32,
        requested: u32,
    },

    /// The requested release exceeds the reserved quantity.
    #[error(
        "Cannot release more than reserved for {stock_id}: reserved {reserved}, requested {requested}"
    )]
    InsufficientReleaseAmount {
        stock_id: StockId,
        reserved: u32,
        requested: u32,
    },

    /// Quantities violate the record invariants.
    #[error("Invalid quantities: {0}")]
    InvalidQuantities(String),

    /// Underlying storage failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Store(StoreError::Database(e))
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
