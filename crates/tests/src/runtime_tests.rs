//! Runtime builder validation and shutdown ordering.
//!
//! Tests use `tokio::time::timeout` so a broken shutdown fails instead of hanging.

use ethpulse_core::{
    config::AppConfig,
    runtime::{EthpulseRuntime, RuntimeError},
    store::{StoreError, TransactionStore},
};
use serial_test::serial;
use std::time::Duration;
use tokio::time::timeout;

use crate::mock_infrastructure::{memory_store, test_config, ScriptedChain};

fn valid_config() -> AppConfig {
    test_config("http://127.0.0.1:9/{key}", &["key-a", "key-b"])
}

async fn quiet_runtime() -> EthpulseRuntime {
    EthpulseRuntime::builder()
        .with_config(valid_config())
        .with_store(memory_store().await)
        .with_provider(ScriptedChain::new())
        .disable_ingestion()
        .disable_session_purger()
        .build()
        .await
        .expect("runtime builds")
}

#[tokio::test]
async fn test_build_requires_config() {
    let result = EthpulseRuntime::builder().build().await;
    assert!(matches!(result, Err(RuntimeError::ConfigValidation(_))));
}

#[tokio::test]
async fn test_build_rejects_invalid_thresholds() {
    let mut config = valid_config();
    config.ingest.resume_threshold = config.ingest.stack_capacity;

    let result = EthpulseRuntime::builder()
        .with_config(config)
        .with_store(memory_store().await)
        .build()
        .await;
    assert!(matches!(result, Err(RuntimeError::ConfigValidation(_))));
}

#[tokio::test]
async fn test_build_rejects_missing_credentials() {
    let mut config = valid_config();
    config.upstream.api_keys = vec!["  ".to_string()];

    let result = EthpulseRuntime::builder()
        .with_config(config)
        .with_store(memory_store().await)
        .build()
        .await;
    assert!(matches!(result, Err(RuntimeError::ConfigValidation(_))));
}

#[tokio::test]
async fn test_build_wires_configured_limits() {
    let runtime = quiet_runtime().await;

    let status = runtime.components().gate().status();
    assert_eq!(status.capacity, 10);
    assert_eq!(status.resume_threshold, 6);
    assert_eq!(status.length, 0);

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_is_idempotent_and_closes_store() {
    let runtime = quiet_runtime().await;
    let store = runtime.components().store().clone();
    assert!(store.query_recent(1).await.is_ok());

    timeout(Duration::from_secs(5), runtime.shutdown()).await.expect("first shutdown");
    timeout(Duration::from_secs(5), runtime.shutdown()).await.expect("second shutdown");

    assert!(matches!(store.query_recent(1).await, Err(StoreError::Closed)));
}

#[tokio::test]
async fn test_shutdown_notifies_every_receiver() {
    let runtime = quiet_runtime().await;
    let mut first = runtime.shutdown_receiver();
    let mut second = runtime.shutdown_receiver();

    runtime.shutdown().await;

    assert!(timeout(Duration::from_secs(1), first.recv()).await.is_ok());
    assert!(timeout(Duration::from_secs(1), second.recv()).await.is_ok());
}

#[tokio::test]
#[serial]
async fn test_shutdown_waits_for_in_flight_tick() {
    let chain = ScriptedChain::new();
    chain.push_block(1, 3).await;
    chain.set_block_delay(Duration::from_millis(300)).await;

    let runtime = EthpulseRuntime::builder()
        .with_config(valid_config())
        .with_store(memory_store().await)
        .with_provider(chain.clone())
        .disable_session_purger()
        .build()
        .await
        .expect("runtime builds");

    // The first interval tick fires immediately and parks in the slow block fetch.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let store = runtime.components().store().clone();
    let gate = runtime.components().gate().clone();

    timeout(Duration::from_secs(5), runtime.shutdown()).await.expect("shutdown completes");

    // The tick's writes landed before the store closed.
    assert_eq!(gate.last_block(), Some(1));
    assert_eq!(gate.status().length, 3);
    assert!(matches!(store.stats().await, Err(StoreError::Closed)));
}
