//! Order document.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{Money, OrderError, OrderItem, OrderStatus, TransitionPolicy};

/// A placed order.
///
/// Items and total are fixed at creation; afterwards only the status and
/// the `updated_at` timestamp change. Orders are never deleted, they move
/// to a terminal status instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    items: Vec<OrderItem>,
    total_amount: Money,
    status: OrderStatus,
    shipping_address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Places a new `Pending` order, computing the total from the items.
    pub fn place(
        id: OrderId,
        user_id: UserId,
        items: Vec<OrderItem>,
        shipping_address: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                });
            }
            if item.price.is_negative() {
                return Err(OrderError::InvalidPrice {
                    product_id: item.product_id.to_string(),
                    price: item.price,
                });
            }
        }

        let total_amount = items.iter().map(OrderItem::line_total).sum();

        Ok(Self {
            id,
            user_id,
            items,
            total_amount,
            status: OrderStatus::Pending,
            shipping_address,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an order from persisted fields without re-validating it.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: OrderId,
        user_id: UserId,
        items: Vec<OrderItem>,
        total_amount: Money,
        status: OrderStatus,
        shipping_address: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            total_amount,
            status,
            shipping_address,
            created_at,
            updated_at,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the items in the order they were requested.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn shipping_address(&self) -> Option<&str> {
        self.shipping_address.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Status changes
impl Order {
    /// Moves the order to `next`, consulting the transition table under `policy`.
    ///
    /// Returns the previous status.
    pub fn transition_to(
        &mut self,
        next: OrderStatus,
        policy: TransitionPolicy,
        now: DateTime<Utc>,
    ) -> Result<OrderStatus, OrderError> {
        self.status.check_transition(next, policy)?;
        let previous = self.status;
        self.status = next;
        self.updated_at = now;
        Ok(previous)
    }

    /// Moves the order to `Cancelled`.
    ///
    /// Fails once the order is delivered. Returns the previous status so the
    /// caller can decide whether reserved stock must be released.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<OrderStatus, OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::NotCancellable {
                status: self.status,
            });
        }
        let previous = self.status;
        self.status = OrderStatus::Cancelled;
        self.updated_at = now;
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn items() -> Vec<OrderItem> {
        vec![
            OrderItem::new("SKU-001", "Widget", 2, Money::new(dec!(10.00))),
            OrderItem::new("SKU-002", "Gadget", 1, Money::new(dec!(25.50))),
        ]
    }

    fn place() -> Order {
        Order::place(
            OrderId::new(1),
            UserId::new(7),
            items(),
            Some("1 Main St".to_string()),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_place_computes_total_and_starts_pending() {
        let order = place();
        assert_eq!(order.total_amount().amount(), dec!(45.50));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.created_at(), order.updated_at());
        assert_eq!(order.shipping_address(), Some("1 Main St"));
    }

    #[test]
    fn test_place_preserves_item_order() {
        let order = place();
        let ids: Vec<_> = order.items().iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["SKU-001", "SKU-002"]);
    }

    #[test]
    fn test_place_without_items_fails() {
        let result = Order::place(OrderId::new(1), UserId::new(1), vec![], None, Utc::now());
        assert_eq!(result, Err(OrderError::NoItems));
    }

    #[test]
    fn test_place_rejects_negative_price() {
        let bad = vec![OrderItem::new("SKU-1", "Broken", 1, Money::new(dec!(-1)))];
        let result = Order::place(OrderId::new(1), UserId::new(1), bad, None, Utc::now());
        assert!(matches!(result, Err(OrderError::InvalidPrice { .. })));
    }

    #[test]
    fn test_strict_transition() {
        let mut order = place();
        let later = order.created_at() + Duration::seconds(5);

        let previous = order
            .transition_to(OrderStatus::Paid, TransitionPolicy::Strict, later)
            .unwrap();
        assert_eq!(previous, OrderStatus::Pending);
        assert_eq!(order.status(), OrderStatus::Paid);
        assert_eq!(order.updated_at(), later);

        let result = order.transition_to(OrderStatus::Pending, TransitionPolicy::Strict, later);
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
        assert_eq!(order.status(), OrderStatus::Paid);
    }

    #[test]
    fn test_permissive_transition_allows_anything() {
        let mut order = place();
        order
            .transition_to(OrderStatus::Delivered, TransitionPolicy::Permissive, Utc::now())
            .unwrap();
        order
            .transition_to(OrderStatus::Pending, TransitionPolicy::Permissive, Utc::now())
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_cancel_delivered_fails() {
        let mut order = place();
        order
            .transition_to(OrderStatus::Delivered, TransitionPolicy::Permissive, Utc::now())
            .unwrap();

        let result = order.cancel(Utc::now());
        assert_eq!(
            result,
            Err(OrderError::NotCancellable {
                status: OrderStatus::Delivered
            })
        );
        assert_eq!(order.status(), OrderStatus::Delivered);
    }

    #[test]
    fn test_cancel_returns_previous_status() {
        let mut order = place();
        let previous = order.cancel(Utc::now()).unwrap();
        assert_eq!(previous, OrderStatus::Pending);
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let order = place();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["total_amount"], "45.50");
        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }
}
