//! Stored-transaction listings and aggregates.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use ethpulse_core::types::{TransactionRecord, TransactionStats};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TransactionList {
    pub count: usize,
    pub transactions: Vec<TransactionRecord>,
}

impl From<Vec<TransactionRecord>> for TransactionList {
    fn from(transactions: Vec<TransactionRecord>) -> Self {
        Self { count: transactions.len(), transactions }
    }
}

/// GET /transactions/recent?limit=
pub async fn recent(
    State(state): State<AppState>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<TransactionList>, ApiError> {
    let Query(params) = params?;
    let limit = state.config.clamp_limit(params.limit);

    let records = state.components.store().query_recent(limit).await?;
    Ok(Json(records.into()))
}

/// GET /transactions/address/{address}?limit=
pub async fn by_address(
    State(state): State<AppState>,
    Path(address): Path<String>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<TransactionList>, ApiError> {
    let Query(params) = params?;
    if address.trim().is_empty() {
        return Err(ApiError::BadRequest("address is required".to_string()));
    }
    let limit = state.config.clamp_limit(params.limit);

    let records = state.components.store().query_by_address(address.trim(), limit).await?;
    Ok(Json(records.into()))
}

/// GET /transactions/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<TransactionStats>, ApiError> {
    Ok(Json(state.components.store().stats().await?))
}
