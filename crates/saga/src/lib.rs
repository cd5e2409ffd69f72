//! Order creation and cancellation workflow.
//!
//! [`OrderWorkflow`] coordinates the buyer check, pricing and stock
//! reservation for a new order, persists it and publishes lifecycle events.
//! Reservations made while creating an order are tracked in a
//! [`ReservationLog`] so that a later failure can release them again.
//!
//! The collaborators are reached through the proxies in [`services`], and
//! payment results arrive asynchronously through [`PaymentCompletedHandler`].

pub mod error;
pub mod payment;
pub mod reservation;
pub mod services;
pub mod workflow;

pub use error::{Resource, Result, WorkflowError};
pub use payment::{AutoPaymentHandler, PaymentCompletedHandler, PaymentProcessor};
pub use reservation::{Reservation, ReservationLog, ReservationState};
pub use services::{
    InMemoryProductCatalog, InMemoryUserDirectory, LedgerStockService, Lookup, Product,
    ProductCatalog, StockCallError, StockService, User, UserDirectory,
};
pub use workflow::{OrderWorkflow, WorkflowConfig};
