//! Order status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Confirmed ──┬──► Paid ──┬──► Processing ──► Shipped ──► Delivered
///           ├──► Paid ───────┘           ├──► Shipped
///           │                            └──► Delivered
///           └──► Cancelled  (also reachable from every non-terminal status)
/// ```
///
/// `Confirmed` may also move straight to `Processing`, `Shipped` or `Delivered`.
/// `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order persisted, stock reserved, awaiting confirmation or payment.
    #[default]
    Pending,

    /// Order confirmed by the merchant.
    Confirmed,

    /// Payment received.
    Paid,

    /// Order is being prepared.
    Processing,

    /// Order handed to the carrier.
    Shipped,

    /// Order delivered to the buyer (terminal state).
    Delivered,

    /// Order cancelled (terminal state).
    Cancelled,
}

/// How strictly direct status updates consult the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Only transitions listed in the table are accepted.
    #[default]
    Strict,

    /// Any status may be set to any other.
    Permissive,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Paid,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns the statuses reachable from this one.
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Paid, Cancelled],
            Confirmed => &[Paid, Processing, Shipped, Delivered, Cancelled],
            Paid => &[Processing, Shipped, Delivered, Cancelled],
            Processing => &[Shipped, Delivered, Cancelled],
            Shipped => &[Delivered, Cancelled],
            Delivered | Cancelled => &[],
        }
    }

    /// Returns true if the table allows moving from this status to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Checks a requested transition against the given policy.
    pub fn check_transition(
        &self,
        next: OrderStatus,
        policy: TransitionPolicy,
    ) -> Result<(), OrderError> {
        match policy {
            TransitionPolicy::Permissive => Ok(()),
            TransitionPolicy::Strict if self.can_transition_to(next) => Ok(()),
            TransitionPolicy::Strict => Err(OrderError::InvalidTransition {
                from: *self,
                to: next,
            }),
        }
    }

    /// Returns true if the order can be cancelled in this status.
    ///
    /// Cancelling an already cancelled order is treated as a no-op by callers,
    /// so only `Delivered` blocks cancellation.
    pub fn can_cancel(&self) -> bool {
        !matches!(self, OrderStatus::Delivered)
    }

    /// Returns true if cancelling from this status must release reserved stock.
    pub fn releases_stock_on_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    /// Parses a status name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| OrderError::InvalidStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_pending_transitions() {
        let pending = OrderStatus::Pending;
        assert!(pending.can_transition_to(OrderStatus::Confirmed));
        assert!(pending.can_transition_to(OrderStatus::Paid));
        assert!(pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!pending.can_transition_to(OrderStatus::Shipped));
        assert!(!pending.can_transition_to(OrderStatus::Delivered));
        assert!(!pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_terminal_statuses_have_no_transitions() {
        for status in OrderStatus::ALL {
            assert!(!OrderStatus::Delivered.can_transition_to(status));
            assert!(!OrderStatus::Cancelled.can_transition_to(status));
        }
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_every_non_terminal_status_can_reach_cancelled() {
        for status in OrderStatus::ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(status.can_transition_to(OrderStatus::Cancelled), "{status}");
        }
    }

    #[test]
    fn test_check_transition_policies() {
        let result = OrderStatus::Delivered
            .check_transition(OrderStatus::Pending, TransitionPolicy::Strict);
        assert_eq!(
            result,
            Err(OrderError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending,
            })
        );

        assert!(
            OrderStatus::Delivered
                .check_transition(OrderStatus::Pending, TransitionPolicy::Permissive)
                .is_ok()
        );
    }

    #[test]
    fn test_cancellation_rules() {
        assert!(!OrderStatus::Delivered.can_cancel());
        assert!(OrderStatus::Shipped.can_cancel());
        assert!(OrderStatus::Cancelled.can_cancel());

        assert!(OrderStatus::Pending.releases_stock_on_cancel());
        assert!(OrderStatus::Confirmed.releases_stock_on_cancel());
        assert!(!OrderStatus::Paid.releases_stock_on_cancel());
        assert!(!OrderStatus::Shipped.releases_stock_on_cancel());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("paid".parse::<OrderStatus>(), Ok(OrderStatus::Paid));
        assert_eq!(" Shipped ".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!(
            "REFUNDED".parse::<OrderStatus>(),
            Err(OrderError::InvalidStatus("REFUNDED".to_string()))
        );
    }

    #[test]
    fn test_display_matches_wire_format() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }
}
