//! Input to order creation.

use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::OrderError;

/// One requested line: which product and how many units.
///
/// Name and price are deliberately absent; they are always taken from the
/// product catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A buyer's request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub user_id: UserId,
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub shipping_address: Option<String>,
}

impl OrderRequest {
    /// Creates a request with no shipping address.
    pub fn new(user_id: UserId, items: Vec<OrderLine>) -> Self {
        Self {
            user_id,
            items,
            shipping_address: None,
        }
    }

    /// Sets the shipping address.
    pub fn with_shipping_address(mut self, address: impl Into<String>) -> Self {
        self.shipping_address = Some(address.into());
        self
    }

    /// Checks the shape of the request before any remote call is made.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::NoItems);
        }

        for line in &self.items {
            if line.product_id.is_blank() {
                return Err(OrderError::ProductIdRequired);
            }
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: line.product_id.to_string(),
                    quantity: line.quantity,
                });
            }
        }

        Ok(())
    }
}
