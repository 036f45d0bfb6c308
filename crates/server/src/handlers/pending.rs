//! Legacy pending-queue endpoints.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use ethpulse_core::ingest::GateStatus;
use serde::Deserialize;

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct PendingParams {
    pub n: Option<i64>,
}

/// GET /pending-queue?n=
///
/// Pops up to `n` hashes, newest first. Popping below the resume threshold re-enables ingestion.
pub async fn pop_pending(
    State(state): State<AppState>,
    params: Result<Query<PendingParams>, QueryRejection>,
) -> Result<Json<Vec<String>>, ApiError> {
    let Query(params) = params?;
    Ok(Json(state.components.pending().pop_n(params.n)))
}

/// GET /pending-queue/status
pub async fn pending_status(State(state): State<AppState>) -> Json<GateStatus> {
    Json(state.components.gate().status())
}
