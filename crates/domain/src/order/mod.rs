//! Order document and related types.

mod document;
mod request;
mod state;
mod value_objects;

pub use document::Order;
pub use request::{OrderLine, OrderRequest};
pub use state::{OrderStatus, TransitionPolicy};
pub use value_objects::{Money, OrderItem};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The status string does not name a known status.
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    /// The transition table forbids moving between these statuses.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order has reached a status from which it cannot be cancelled.
    #[error("Order cannot be cancelled in {status} status")]
    NotCancellable { status: OrderStatus },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity for product {product_id}: {quantity} (must be at least 1)")]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// Product ID is missing.
    #[error("Product ID is required for every order item")]
    ProductIdRequired,

    /// Invalid price.
    #[error("Invalid price for product {product_id}: {price} (must not be negative)")]
    InvalidPrice { product_id: String, price: Money },
}
