//! Live chain lookups through the provider pool.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::{error::ApiError, AppState};

/// GET /tx/{hash}
///
/// Returns the provider's transaction object untouched.
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let tx = state.components.provider().transaction(&hash).await?;
    Ok(Json(tx))
}

/// GET /balance/{address}
///
/// The balance is a decimal wei string.
pub async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let balance = state.components.provider().balance(&address).await?;
    Ok(Json(json!({ "balance": balance.to_string() })))
}
