//! Natural-language translation endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use ethpulse_core::nl2sql::{SessionCredential, TranslationRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NlToSqlRequest {
    pub natural_language: String,
    pub session_id: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NlToSqlResponse {
    pub natural_language: String,
    pub sql_query: String,
    pub method: String,
}

/// POST /nl-to-sql
///
/// A session credential, when present, selects its provider unless the request names one.
/// A request naming a different provider never receives the session's key.
/// Unknown sessions are ignored; sessions whose credential cannot be decrypted are a 401.
pub async fn translate(
    State(state): State<AppState>,
    body: Result<Json<NlToSqlRequest>, JsonRejection>,
) -> Result<Json<NlToSqlResponse>, ApiError> {
    let Json(request) = body?;
    if request.natural_language.trim().is_empty() {
        return Err(ApiError::BadRequest("naturalLanguage is required".to_string()));
    }

    let resolved = match request.session_id.as_deref() {
        Some(session_id) => state.components.sessions().resolve(session_id).await?,
        None => None,
    };
    if let Some(ref credential) = resolved {
        debug!(provider = %credential.provider, "using session credential for translation");
    }

    let translation = state
        .components
        .translator()
        .translate(TranslationRequest {
            text: &request.natural_language,
            provider: request.provider.as_deref(),
            model: request.model.as_deref(),
            credential: resolved.as_ref().map(|c| SessionCredential {
                provider: &c.provider,
                api_key: &c.api_key,
            }),
        })
        .await;

    Ok(Json(NlToSqlResponse {
        natural_language: request.natural_language,
        sql_query: translation.sql_query,
        method: translation.method,
    }))
}
