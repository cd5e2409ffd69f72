//! Shared handler state.

use std::sync::Arc;

use ledger::StockLedger;
use messaging::EventBus;
use saga::{OrderWorkflow, PaymentProcessor};

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub workflow: OrderWorkflow,
    pub ledger: Arc<dyn StockLedger>,
    pub payments: PaymentProcessor,
    pub events: EventBus,
}
