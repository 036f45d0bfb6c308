use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

/// GET /health
///
/// Liveness only. Ingestion trouble shows up in `/pending-queue/status` and metrics, not here.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let gate = state.components.gate().status();

    Json(json!({
        "status": "ok",
        "ingestion": gate.state,
        "lastBlock": gate.last_block,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[allow(clippy::unused_async)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.prometheus.as_ref().map(|handle| handle.render()).unwrap_or_default();

    (StatusCode::OK, [("content-type", "text/plain; version=0.0.4; charset=utf-8")], body)
}
