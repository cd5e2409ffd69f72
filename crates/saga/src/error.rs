//! Workflow error types.

use common::OrderId;
use domain::{OrderError, OrderStatus};
use store::StoreError;
use thiserror::Error;

/// Collaborator or record kind named in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Product,
    Stock,
    Order,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::User => "User",
            Resource::Product => "Product",
            Resource::Stock => "Stock",
            Resource::Order => "Order",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the order workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The request is malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A user, product, stock record or order does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: Resource, id: String },

    /// Not enough stock is available for an item.
    #[error("Insufficient stock for product {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_name: String,
        available: u32,
        requested: u32,
    },

    /// A collaborator could not be reached.
    #[error("{service} service unavailable: {reason}")]
    ServiceUnavailable { service: Resource, reason: String },

    /// The status string is not a known status.
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    /// The transition table forbids the requested status change.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order is delivered.
    #[error("Order {order_id} cannot be cancelled in {status} status")]
    OrderNotCancellable {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Durable storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl WorkflowError {
    pub fn not_found(resource: Resource, id: impl ToString) -> Self {
        WorkflowError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn unavailable(service: Resource, reason: impl Into<String>) -> Self {
        WorkflowError::ServiceUnavailable {
            service,
            reason: reason.into(),
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation",
            WorkflowError::NotFound { .. } => "not_found",
            WorkflowError::InsufficientStock { .. } => "insufficient_stock",
            WorkflowError::ServiceUnavailable { .. } => "service_unavailable",
            WorkflowError::InvalidStatus(_) => "invalid_status",
            WorkflowError::InvalidTransition { .. } => "invalid_transition",
            WorkflowError::OrderNotCancellable { .. } => "not_cancellable",
            WorkflowError::Storage(_) => "storage",
        }
    }

    /// Maps an order rule violation on `order_id` into the workflow taxonomy.
    pub fn from_order(order_id: OrderId, e: OrderError) -> Self {
        match e {
            OrderError::InvalidStatus(s) => WorkflowError::InvalidStatus(s),
            OrderError::InvalidTransition { from, to } => {
                WorkflowError::InvalidTransition { from, to }
            }
            OrderError::NotCancellable { status } => {
                WorkflowError::OrderNotCancellable { order_id, status }
            }
            other => WorkflowError::Validation(other.to_string()),
        }
    }
}

/// Convenience type alias for workflow results.
pub type Result<T> = std::result::Result<T, WorkflowError>;
