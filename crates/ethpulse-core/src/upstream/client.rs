use alloy_primitives::{U256, U64};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tracing::{debug, warn};

use super::{
    credentials::{Credential, CredentialSet, RotationOutcome},
    http_client::{HttpClient, HttpClientConfig},
    ChainProvider, UpstreamError,
};
use crate::{
    config::UpstreamConfig,
    metrics,
    types::{JsonRpcRequest, JsonRpcResponse, RpcBlock},
};

/// JSON-RPC client that fails over across a credential pool on rate limits.
///
/// Each call starts with the pool's current credential. A rate-limit-class error rotates the
/// pool and retries after `retry_delay`, for at most one attempt per credential. Any other
/// error propagates immediately without rotating. Exhausting the pool returns the last
/// rate-limit error.
pub struct FailoverClient {
    credentials: CredentialSet,
    http: HttpClient,
    timeout: Duration,
    retry_delay: Duration,
    next_id: AtomicU64,
}

impl FailoverClient {
    #[must_use]
    pub fn new(
        credentials: CredentialSet,
        http: HttpClient,
        timeout: Duration,
        retry_delay: Duration,
    ) -> Self {
        Self { credentials, http, timeout, retry_delay, next_id: AtomicU64::new(1) }
    }

    /// Builds the client from the `[upstream]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::NoCredentials`] when no API key is configured, or a connection
    /// error if the HTTP client cannot be built.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let credentials =
            CredentialSet::from_api_keys(&config.api_keys, &config.url_template, &config.network)?;
        let http = HttpClient::with_config(HttpClientConfig::default())?;

        Ok(Self::new(
            credentials,
            http,
            Duration::from_secs(config.timeout_seconds),
            Duration::from_millis(config.retry_delay_ms),
        ))
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    /// Sends `method` with rate-limit failover and returns the raw `result` value.
    ///
    /// # Errors
    ///
    /// Returns the first non-rate-limit error, or the last rate-limit error once every
    /// credential has been tried.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, UpstreamError> {
        let attempts = self.credentials.len();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(method, Some(params), json!(id));
        let body = bytes::Bytes::from(serde_json::to_vec(&request).map_err(|e| {
            UpstreamError::InvalidRequest(format!("Failed to serialize request: {e}"))
        })?);

        let mut last_error = None;

        for attempt in 0..attempts {
            let (index, credential) = self.credentials.current();

            match self.send_once(credential, body.clone()).await {
                Ok(result) => {
                    debug!(
                        method,
                        credential = credential.label(),
                        attempt,
                        "upstream call succeeded"
                    );
                    return Ok(result);
                }
                Err(e) if e.is_rate_limit() => {
                    metrics::record_upstream_error(&e);
                    warn!(
                        method,
                        credential = credential.label(),
                        index,
                        attempt,
                        error = %e,
                        "upstream rate limited"
                    );

                    match self.credentials.rotate_from(index) {
                        RotationOutcome::Rotated { from, to } => {
                            metrics::record_credential_rotation();
                            debug!(from, to, "rotated upstream credential");
                        }
                        RotationOutcome::Superseded { current } => {
                            debug!(failed = index, current, "credential already rotated by another call");
                        }
                        RotationOutcome::SingleCredential => {
                            warn!("only one upstream credential configured, rotation skipped");
                        }
                    }

                    last_error = Some(e);
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Err(e) => {
                    metrics::record_upstream_error(&e);
                    debug!(
                        method,
                        credential = credential.label(),
                        error = %e,
                        "upstream call failed"
                    );
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or(UpstreamError::NoCredentials))
    }

    async fn send_once(
        &self,
        credential: &Credential,
        body: bytes::Bytes,
    ) -> Result<Value, UpstreamError> {
        let response_bytes =
            self.http.post_json(credential.endpoint_url(), body, self.timeout).await?;

        let response: JsonRpcResponse = serde_json::from_slice(&response_bytes)
            .map_err(|e| UpstreamError::InvalidResponse(format!("Invalid JSON: {e}")))?;

        if let Some(error) = response.error {
            return Err(UpstreamError::RpcError(error.code, error.message));
        }

        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ChainProvider for FailoverClient {
    async fn latest_block_number(&self) -> Result<u64, UpstreamError> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        let number: U64 = serde_json::from_value(result)
            .map_err(|e| UpstreamError::InvalidResponse(format!("block number: {e}")))?;
        Ok(number.to::<u64>())
    }

    async fn block_with_transactions(&self, number: u64) -> Result<RpcBlock, UpstreamError> {
        let result = self
            .call("eth_getBlockByNumber", json!([format!("0x{number:x}"), true]))
            .await?;

        if result.is_null() {
            return Err(UpstreamError::NotFound(format!("block {number}")));
        }

        serde_json::from_value(result)
            .map_err(|e| UpstreamError::InvalidResponse(format!("block {number}: {e}")))
    }

    async fn transaction(&self, hash: &str) -> Result<Value, UpstreamError> {
        if !is_hex_of_len(hash, 64) {
            return Err(UpstreamError::InvalidRequest(format!("malformed transaction hash: {hash}")));
        }

        let result = self.call("eth_getTransactionByHash", json!([hash])).await?;
        if result.is_null() {
            return Err(UpstreamError::NotFound(format!("transaction {hash}")));
        }
        Ok(result)
    }

    async fn balance(&self, address: &str) -> Result<U256, UpstreamError> {
        if !is_hex_of_len(address, 40) {
            return Err(UpstreamError::InvalidRequest(format!("malformed address: {address}")));
        }

        let result = self.call("eth_getBalance", json!([address, "latest"])).await?;
        serde_json::from_value(result)
            .map_err(|e| UpstreamError::InvalidResponse(format!("balance: {e}")))
    }
}

/// `0x` followed by exactly `digits` hex characters.
pub(crate) fn is_hex_of_len(value: &str, digits: usize) -> bool {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .is_some_and(|hex| hex.len() == digits && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
