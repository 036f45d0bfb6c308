//! Fixtures shared by the integration tests.

use alloy_primitives::U256;
use async_trait::async_trait;
use ethpulse_core::{
    config::AppConfig,
    store::{SqliteStore, TransactionStore},
    types::{RpcBlock, TransactionRecord},
    upstream::{ChainProvider, UpstreamError},
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::Mutex;

/// Provider transaction object with the fields ingestion reads.
#[must_use]
pub fn create_test_transaction(
    hash: &str,
    block_number: u64,
    from: &str,
    to: Option<&str>,
    value_wei: u128,
) -> Value {
    json!({
        "hash": hash,
        "blockNumber": format!("0x{block_number:x}"),
        "from": from,
        "to": to,
        "value": format!("0x{value_wei:x}"),
        "gas": "0x5208",
        "gasPrice": "0x3b9aca00",
        "nonce": "0x0",
        "input": "0x",
    })
}

/// Valid configuration for `keys` with every upstream call routed through `url_template`.
#[must_use]
pub fn test_config(url_template: &str, keys: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.upstream.api_keys = keys.iter().map(|k| (*k).to_string()).collect();
    config.upstream.url_template = url_template.to_string();
    config.upstream.timeout_seconds = 2;
    config.upstream.retry_delay_ms = 1;
    config.store.database_url = "sqlite::memory:".to_string();
    config.ingest.fetch_interval_ms = 50;
    config.ingest.stack_capacity = 10;
    config.ingest.resume_threshold = 6;
    config
}

pub async fn memory_store() -> Arc<SqliteStore> {
    let store = SqliteStore::connect("sqlite::memory:", 1).await.expect("in-memory store");
    store.initialize().await.expect("schema");
    Arc::new(store)
}

#[must_use]
pub fn test_record(
    hash: &str,
    block: u64,
    from: &str,
    to: Option<&str>,
    value: &str,
) -> TransactionRecord {
    let now = chrono::Utc::now();
    TransactionRecord {
        hash: hash.to_string(),
        block_number: block,
        from_address: from.to_string(),
        to_address: to.map(str::to_string),
        value: value.to_string(),
        gas_price: "1000000000".to_string(),
        gas_limit: 21_000,
        nonce: 0,
        data: String::new(),
        timestamp: now,
        created_at: now,
    }
}

/// In-process chain whose head and blocks are set by the test.
///
/// `block_delay` makes block fetches slow so overlapping ticks can be observed.
#[derive(Default)]
pub struct ScriptedChain {
    head: AtomicU64,
    blocks: Mutex<HashMap<u64, RpcBlock>>,
    block_delay: Mutex<Option<Duration>>,
    fail_head: Mutex<bool>,
    pub block_fetches: AtomicUsize,
}

impl ScriptedChain {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Publishes block `number` with `tx_count` transfers and makes it the head.
    pub async fn push_block(&self, number: u64, tx_count: usize) {
        let value = super::BlockResponseBuilder::new(number).with_transfers(tx_count).build();
        let block: RpcBlock = serde_json::from_value(value).expect("valid block fixture");
        self.blocks.lock().await.insert(number, block);
        self.head.store(number, Ordering::SeqCst);
    }

    pub async fn set_block_delay(&self, delay: Duration) {
        *self.block_delay.lock().await = Some(delay);
    }

    pub async fn set_head_failure(&self, fail: bool) {
        *self.fail_head.lock().await = fail;
    }
}

#[async_trait]
impl ChainProvider for ScriptedChain {
    async fn latest_block_number(&self) -> Result<u64, UpstreamError> {
        if *self.fail_head.lock().await {
            return Err(UpstreamError::Timeout);
        }
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn block_with_transactions(&self, number: u64) -> Result<RpcBlock, UpstreamError> {
        self.block_fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.block_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.blocks
            .lock()
            .await
            .get(&number)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound(format!("block {number}")))
    }

    async fn transaction(&self, hash: &str) -> Result<Value, UpstreamError> {
        Err(UpstreamError::NotFound(format!("transaction {hash}")))
    }

    async fn balance(&self, _address: &str) -> Result<U256, UpstreamError> {
        Ok(U256::ZERO)
    }
}
