//! Wire and domain types shared across the crate.
//!
//! The JSON-RPC envelope types mirror JSON-RPC 2.0. The `Rpc*` types decode the subset of
//! `eth_getBlockByNumber` / `eth_getTransactionByHash` output the tracker needs, tolerating
//! missing fields so a sparse provider response still maps to a [`TransactionRecord`].

use alloy_primitives::{U256, U64};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, sync::Arc};

/// JSON-RPC protocol version as a `Cow` for allocation-free construction.
pub const JSONRPC_VERSION_COW: Cow<'static, str> = Cow::Borrowed("2.0");

/// JSON-RPC 2.0 request structure.
///
/// # Example
///
/// ```
/// use ethpulse_core::types::JsonRpcRequest;
/// use serde_json::json;
///
/// let request = JsonRpcRequest::new("eth_blockNumber", None, json!(1));
///
/// assert_eq!(request.method, "eth_blockNumber");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Cow<'static, str>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    pub id: Arc<serde_json::Value>,
}

impl JsonRpcRequest {
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        params: Option<serde_json::Value>,
        id: serde_json::Value,
    ) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, method: method.into(), params, id: Arc::new(id) }
    }
}

/// JSON-RPC 2.0 response structure.
///
/// Contains either a `result` or an `error`. A `null` result is valid and means "not found" for
/// lookups such as `eth_getTransactionByHash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: Arc<serde_json::Value>,
}

/// JSON-RPC 2.0 error object.
///
/// Standard codes: `-32700` parse error, `-32600` invalid request, `-32601` method not found,
/// `-32602` invalid params, `-32603` internal error, `-32005` limit exceeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Transaction object as returned inside a block fetched with full transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: String,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<U256>,
    #[serde(default)]
    pub gas_price: Option<U256>,
    #[serde(default)]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub gas: Option<U64>,
    #[serde(default)]
    pub nonce: Option<U64>,
    #[serde(default)]
    pub input: Option<String>,
}

/// Block with full transaction objects (`eth_getBlockByNumber(n, true)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    #[serde(default)]
    pub number: Option<U64>,
    #[serde(default)]
    pub hash: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub timestamp: Option<U64>,
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
}

/// A transaction as persisted in the durable store.
///
/// `value` and `gas_price` are decimal strings of 256-bit integers and are never narrowed to a
/// float. `hash` is the natural key: re-inserting the same hash replaces the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: String,
    pub block_number: u64,
    pub from_address: String,
    /// `None` for contract creation.
    pub to_address: Option<String>,
    pub value: String,
    pub gas_price: String,
    pub gas_limit: u64,
    pub nonce: u64,
    /// Hex calldata, empty when elided.
    pub data: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Maps a provider transaction into a record.
    ///
    /// Missing numeric fields default to zero and a missing payload to an empty string. The
    /// block's number and timestamp win over the transaction's own `blockNumber` since the
    /// transaction was observed in that block.
    #[must_use]
    pub fn from_rpc(
        tx: &RpcTransaction,
        block_number: u64,
        block_timestamp: Option<u64>,
        keep_input: bool,
        observed_at: DateTime<Utc>,
    ) -> Self {
        let timestamp = block_timestamp
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(observed_at);

        let gas_price = tx.gas_price.or(tx.max_fee_per_gas).unwrap_or_default();

        let data = if keep_input { tx.input.clone().unwrap_or_default() } else { String::new() };

        Self {
            hash: tx.hash.to_lowercase(),
            block_number,
            from_address: tx.from.as_deref().map(str::to_lowercase).unwrap_or_default(),
            to_address: tx.to.as_deref().map(str::to_lowercase),
            value: tx.value.unwrap_or_default().to_string(),
            gas_price: gas_price.to_string(),
            gas_limit: tx.gas.map_or(0, |g| g.to::<u64>()),
            nonce: tx.nonce.map_or(0, |n| n.to::<u64>()),
            data,
            timestamp,
            created_at: observed_at,
        }
    }
}

/// Aggregate statistics over the whole transaction table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStats {
    pub total_transactions: i64,
    pub unique_senders: i64,
    pub unique_receivers: i64,
    pub min_block: Option<i64>,
    pub max_block: Option<i64>,
    /// Mean of the numeric `value` strings in wei, rendered without exponent.
    pub avg_value: Option<String>,
}
