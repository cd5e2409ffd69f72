//! Reservation log for the order-creation saga.

use common::{ProductId, StockId};

use crate::services::StockService;

/// One successful stock reservation made while creating an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub stock_id: StockId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Lifecycle of a reservation log.
///
/// ```text
/// Open ──┬──► Committed
///        ├──► Compensating ──► RolledBack
///        └──► Abandoned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReservationState {
    /// Reservations are being made.
    #[default]
    Open,
    /// The order was persisted; the reservations now belong to it.
    Committed,
    /// A later step failed and recorded reservations are being released.
    Compensating,
    /// Every recorded reservation has been released (or release was attempted).
    RolledBack,
    /// A later step failed and the reservations were deliberately left in place.
    Abandoned,
}

impl ReservationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationState::Committed | ReservationState::RolledBack | ReservationState::Abandoned
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Open => "Open",
            ReservationState::Committed => "Committed",
            ReservationState::Compensating => "Compensating",
            ReservationState::RolledBack => "RolledBack",
            ReservationState::Abandoned => "Abandoned",
        }
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered record of the reservations made for one order request.
#[derive(Debug, Default)]
pub struct ReservationLog {
    state: ReservationState,
    reservations: Vec<Reservation>,
}

impl ReservationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReservationState {
        self.state
    }

    /// Reservations in the order they were made.
    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn record(&mut self, reservation: Reservation) {
        if self.state == ReservationState::Open {
            self.reservations.push(reservation);
        }
    }

    pub fn commit(&mut self) {
        if self.state == ReservationState::Open {
            self.state = ReservationState::Committed;
        }
    }

    /// Leaves every recorded reservation in place.
    pub fn abandon(&mut self) {
        if self.state == ReservationState::Open {
            if !self.reservations.is_empty() {
                tracing::warn!(
                    reservations = self.reservations.len(),
                    "Order creation failed, earlier reservations left in place"
                );
            }
            self.state = ReservationState::Abandoned;
        }
    }

    /// Releases every recorded reservation, newest first.
    ///
    /// Release failures are logged and do not stop the remaining releases.
    /// Returns how many releases failed.
    pub async fn compensate(&mut self, stock: &dyn StockService) -> usize {
        if self.state != ReservationState::Open {
            return 0;
        }
        self.state = ReservationState::Compensating;

        let mut failures = 0;
        for reservation in self.reservations.iter().rev() {
            match stock.release(reservation.stock_id, reservation.quantity).await {
                Ok(_) => {
                    tracing::info!(
                        stock_id = %reservation.stock_id,
                        product_id = %reservation.product_id,
                        quantity = reservation.quantity,
                        "Reservation released"
                    );
                }
                Err(e) => {
                    failures += 1;
                    tracing::error!(
                        stock_id = %reservation.stock_id,
                        product_id = %reservation.product_id,
                        quantity = reservation.quantity,
                        error = %e,
                        "Failed to release reservation"
                    );
                }
            }
        }

        self.state = ReservationState::RolledBack;
        failures
    }
}
