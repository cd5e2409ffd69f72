//! Order placement, query, status and cancellation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{OrderId, UserId};
use domain::{Order, OrderRequest};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

/// POST /orders: place an order.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.workflow.create_order(req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders: list every order.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.workflow.list_orders().await?))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.workflow.get_order(OrderId::new(id)).await?))
}

/// GET /orders/user/{user_id}
#[tracing::instrument(skip(state))]
pub async fn list_by_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .workflow
        .list_orders_by_user(UserId::new(user_id))
        .await?;
    Ok(Json(orders))
}

/// PUT /orders/{id}/status?status=PAID
#[tracing::instrument(skip(state, query), fields(status = %query.status))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .workflow
        .update_order_status(OrderId::new(id), &query.status)
        .await?;
    Ok(Json(order))
}

/// DELETE /orders/{id}: cancel an order.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.workflow.cancel_order(OrderId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
