//! Liveness endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Live subscriptions on the event bus.
    pub event_consumers: usize,
}

/// GET /health
///
/// Reports `degraded` while nothing consumes the event bus, since payment
/// results would then never reach their orders.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let event_consumers = state.events.subscriber_count();
    Json(HealthResponse {
        status: if event_consumers > 0 { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        event_consumers,
    })
}
