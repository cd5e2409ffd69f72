use async_trait::async_trait;

use crate::Result;

/// Counter used for order identifiers.
pub const ORDER_SEQUENCE: &str = "order_sequence";

/// Counter used for stock record identifiers.
pub const STOCK_SEQUENCE: &str = "stock_sequence";

/// Allocates monotonically increasing identifiers from named counters.
///
/// Implementations must perform an atomic increment-and-fetch: concurrent
/// callers never receive the same value and no value is skipped. The first
/// value handed out for a fresh counter is 1.
#[async_trait]
pub trait SequenceGenerator: Send + Sync {
    /// Increments the named counter and returns its new value.
    async fn next_value(&self, name: &str) -> Result<i64>;
}
