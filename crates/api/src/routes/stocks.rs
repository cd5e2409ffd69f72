//! Stock ledger endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{ProductId, StockId};
use ledger::{NewStock, StockRecord, StockUpdate};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QuantityQuery {
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct StockResponse {
    #[serde(flatten)]
    pub record: StockRecord,
    pub available_quantity: u32,
}

impl From<StockRecord> for StockResponse {
    fn from(record: StockRecord) -> Self {
        let available_quantity = record.available_quantity();
        Self {
            record,
            available_quantity,
        }
    }
}

/// POST /stocks: provision a record for a product.
#[tracing::instrument(skip(state, req), fields(product_id = %req.product_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewStock>,
) -> Result<(StatusCode, Json<StockResponse>), ApiError> {
    let record = state.ledger.create(req).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /stocks
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StockResponse>>, ApiError> {
    let records = state.ledger.list().await?;
    Ok(Json(records.into_iter().map(StockResponse::from).collect()))
}

/// GET /stocks/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<StockResponse>, ApiError> {
    Ok(Json(state.ledger.get(StockId::new(id)).await?.into()))
}

/// GET /stocks/product/{product_id}
#[tracing::instrument(skip(state))]
pub async fn get_by_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<StockResponse>, ApiError> {
    let record = state
        .ledger
        .get_by_product(&ProductId::new(product_id))
        .await?;
    Ok(Json(record.into()))
}

/// PUT /stocks/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<StockUpdate>,
) -> Result<Json<StockResponse>, ApiError> {
    Ok(Json(state.ledger.update(StockId::new(id), req).await?.into()))
}

/// DELETE /stocks/{id}
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.ledger.delete(StockId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /stocks/{id}/reserve?quantity=N
#[tracing::instrument(skip(state, query), fields(quantity = query.quantity))]
pub async fn reserve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<QuantityQuery>,
) -> Result<Json<StockResponse>, ApiError> {
    let record = state
        .ledger
        .reserve(StockId::new(id), query.quantity)
        .await?;
    Ok(Json(record.into()))
}

/// POST /stocks/{id}/release?quantity=N
#[tracing::instrument(skip(state, query), fields(quantity = query.quantity))]
pub async fn release(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<QuantityQuery>,
) -> Result<Json<StockResponse>, ApiError> {
    let record = state
        .ledger
        .release(StockId::new(id), query.quantity)
        .await?;
    Ok(Json(record.into()))
}
