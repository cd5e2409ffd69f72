use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::Order;

use crate::Result;

/// Durable storage for placed orders.
///
/// Orders are never deleted; `save` inserts a new order or overwrites the
/// stored copy of an existing one.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts or replaces an order.
    async fn save(&self, order: &Order) -> Result<()>;

    /// Loads an order by ID. Returns None if it doesn't exist.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    /// Returns all orders placed by a user, oldest first.
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Returns every order, oldest first.
    async fn find_all(&self) -> Result<Vec<Order>>;
}
