//! Payment mock endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub order_id: OrderId,
    pub message: String,
}

/// POST /payments/process: charge an order and announce the result.
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id))]
pub async fn process(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PaymentRequest>,
) -> (StatusCode, Json<PaymentResponse>) {
    let order_id = req.order_id;
    if state.payments.process(order_id).await {
        (
            StatusCode::OK,
            Json(PaymentResponse {
                order_id,
                message: format!("Payment processed successfully for order {order_id}"),
            }),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(PaymentResponse {
                order_id,
                message: format!("Payment failed for order {order_id}"),
            }),
        )
    }
}
