//! LLM credential session endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use ethpulse_core::auth::SessionSummary;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub user_id: String,
    pub provider: String,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub success: bool,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub user_id: String,
    pub connected: bool,
    pub sessions: Vec<SessionSummary>,
}

/// POST /auth/connect
pub async fn connect(
    State(state): State<AppState>,
    body: Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let Json(request) = body?;
    let session_id = state
        .components
        .sessions()
        .connect(&request.user_id, &request.provider, &request.api_key)
        .await?;

    Ok(Json(ConnectResponse { success: true, session_id }))
}

/// POST /auth/disconnect
pub async fn disconnect(
    State(state): State<AppState>,
    body: Result<Json<DisconnectRequest>, JsonRejection>,
) -> Result<Json<DisconnectResponse>, ApiError> {
    let Json(request) = body?;
    if state.components.sessions().disconnect(&request.session_id).await {
        Ok(Json(DisconnectResponse { success: true }))
    } else {
        Err(ApiError::NotFound("Session not found".to_string()))
    }
}

/// GET /auth/status/{userId}
pub async fn status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<StatusResponse> {
    let sessions = state.components.sessions().status(&user_id).await;
    Json(StatusResponse { connected: !sessions.is_empty(), user_id, sessions })
}
