//! Stock record and the arithmetic that guards it.

use common::{ProductId, StockId};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result};

/// Quantity on hand and quantity held for orders, for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: StockId,
    pub product_id: ProductId,
    /// Total owned units.
    pub quantity: u32,
    /// Units held by placed orders.
    pub reserved_quantity: u32,
    pub location: Option<String>,
}

impl StockRecord {
    /// Units eligible for new reservations.
    pub fn available_quantity(&self) -> u32 {
        self.quantity.saturating_sub(self.reserved_quantity)
    }

    /// Adds `qty` to the reserved count if enough units are available.
    ///
    /// On failure the record is left unchanged.
    pub fn reserve(&mut self, qty: u32) -> Result<()> {
        check_positive(qty)?;
        let available = self.available_quantity();
        if qty > available {
            return Err(LedgerError::InsufficientStock {
                stock_id: self.id,
                available,
                requested: qty,
            });
        }
        self.reserved_quantity += qty;
        Ok(())
    }

    /// Removes `qty` from the reserved count if that many are reserved.
    ///
    /// On failure the record is left unchanged.
    pub fn release(&mut self, qty: u32) -> Result<()> {
        check_positive(qty)?;
        if qty > self.reserved_quantity {
            return Err(LedgerError::InsufficientReleaseAmount {
                stock_id: self.id,
                reserved: self.reserved_quantity,
                requested: qty,
            });
        }
        self.reserved_quantity -= qty;
        Ok(())
    }
}

fn check_positive(qty: u32) -> Result<()> {
    if qty == 0 {
        return Err(LedgerError::InvalidQuantities(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn check_within(quantity: u32, reserved_quantity: u32) -> Result<()> {
    if reserved_quantity > quantity {
        return Err(LedgerError::InvalidQuantities(format!(
            "reserved quantity {reserved_quantity} exceeds quantity {quantity}"
        )));
    }
    Ok(())
}

/// Input for provisioning a stock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStock {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub reserved_quantity: u32,
    #[serde(default)]
    pub location: Option<String>,
}

impl NewStock {
    /// Creates a record request with nothing reserved.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            reserved_quantity: 0,
            location: None,
        }
    }

    /// Sets the warehouse location.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Checks that the request satisfies the record invariants.
    pub fn validate(&self) -> Result<()> {
        if self.product_id.is_blank() {
            return Err(LedgerError::InvalidQuantities(
                "product id is required".to_string(),
            ));
        }
        check_within(self.quantity, self.reserved_quantity)
    }

    /// Builds the record once an ID has been allocated.
    pub fn into_record(self, id: StockId) -> StockRecord {
        StockRecord {
            id,
            product_id: self.product_id,
            quantity: self.quantity,
            reserved_quantity: self.reserved_quantity,
            location: self.location,
        }
    }
}

/// Replacement values for an existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub quantity: u32,
    pub reserved_quantity: u32,
    #[serde(default)]
    pub location: Option<String>,
}

impl StockUpdate {
    /// Checks that the update satisfies the record invariants.
    pub fn validate(&self) -> Result<()> {
        check_within(self.quantity, self.reserved_quantity)
    }

    /// Applies the update to a record.
    pub fn apply(self, record: &mut StockRecord) {
        record.quantity = self.quantity;
        record.reserved_quantity = self.reserved_quantity;
        record.location = self.location;
    }
}
