//! Stock ledger.
//!
//! Each product owns exactly one [`StockRecord`] holding a total `quantity`
//! and a `reserved_quantity`. The ledger guarantees that
//! `available = quantity - reserved_quantity` never becomes negative:
//! every reserve and release is a single read-modify-write on one record.
//!
//! Two implementations are provided:
//! - [`InMemoryStockLedger`]: an arena of records, each behind its own mutex
//! - [`PostgresStockLedger`]: conditional `UPDATE ... RETURNING` statements

pub mod error;
pub mod ledger;
pub mod memory;
pub mod postgres;
pub mod record;

pub use error::{LedgerError, Result};
pub use ledger::StockLedger;
pub use memory::InMemoryStockLedger;
pub use postgres::PostgresStockLedger;
pub use record::{NewStock, StockRecord, StockUpdate};
