use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use ethpulse_core::query::QueryResponse;
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

/// POST /query
///
/// Runs one SELECT statement. Anything else is a 400 and never reaches the store.
pub async fn execute(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = body?;
    let response = state.components.gateway().execute(&request.sql, &request.params).await?;
    Ok(Json(response))
}
