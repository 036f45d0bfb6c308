//! Upstream credential failover against a mockito JSON-RPC provider.
//!
//! Every credential maps to its own path on the mock server, so a test decides per key
//! whether the provider rate-limits, errors or answers.

use alloy_primitives::U256;
use ethpulse_core::upstream::{ChainProvider, FailoverClient, UpstreamError};
use serde_json::Value;

use crate::mock_infrastructure::{test_config, RpcMockBuilder};

const ADDRESS: &str = "0x00000000000000000000000000000000000000a1";

fn client_for(rpc: &RpcMockBuilder, keys: &[&str]) -> FailoverClient {
    let config = test_config(&rpc.url_template(), keys);
    FailoverClient::from_config(&config.upstream).expect("client builds")
}

#[tokio::test]
async fn test_rate_limited_credentials_rotate_until_one_answers() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_rate_limited("key-a").mock_rate_limited("key-b").mock_get_balance("key-c", 1_000);

    let client = client_for(&rpc, &["key-a", "key-b", "key-c"]);
    let balance = client.balance(ADDRESS).await.expect("third credential answers");

    assert_eq!(balance, U256::from(1_000u64));
    assert_eq!(client.credentials().current_index(), 2);
    rpc.assert_all().await;
}

#[tokio::test]
async fn test_rpc_limit_error_rotates_like_http_429() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_rpc_limit_error("key-a").mock_block_number("key-b", 0x1234);

    let client = client_for(&rpc, &["key-a", "key-b"]);
    let latest = client.latest_block_number().await.expect("second credential answers");

    assert_eq!(latest, 0x1234);
    assert_eq!(client.credentials().current_index(), 1);
    rpc.assert_all().await;
}

#[tokio::test]
async fn test_rotation_persists_across_calls() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_rate_limited("key-a").mock_block_number("key-b", 7);

    let client = client_for(&rpc, &["key-a", "key-b"]);
    assert_eq!(client.latest_block_number().await.unwrap(), 7);

    // The next call starts on the credential that worked last time.
    assert_eq!(client.latest_block_number().await.unwrap(), 7);
    assert_eq!(client.credentials().current_index(), 1);
}

#[tokio::test]
async fn test_exhausted_pool_returns_last_rate_limit_error() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_rate_limited("key-a").mock_rate_limited("key-b");

    let client = client_for(&rpc, &["key-a", "key-b"]);
    let err = client.latest_block_number().await.unwrap_err();

    assert!(err.is_rate_limit(), "unexpected error: {err}");
    // One rotation per rate-limited attempt brings the cursor back to the start.
    assert_eq!(client.credentials().current_index(), 0);
    rpc.assert_all().await;
}

#[tokio::test]
async fn test_single_credential_rate_limit_fails_without_rotating() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_rate_limited("only");

    let client = client_for(&rpc, &["only"]);
    let err = client.balance(ADDRESS).await.unwrap_err();

    assert!(matches!(err, UpstreamError::HttpError(429, _)));
    assert_eq!(client.credentials().current_index(), 0);
}

#[tokio::test]
async fn test_not_found_propagates_without_rotation() {
    let hash = format!("0x{}", "ab".repeat(32));
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_get_transaction("key-a", &hash, &Value::Null);

    let client = client_for(&rpc, &["key-a", "key-b"]);
    let err = client.transaction(&hash).await.unwrap_err();

    assert!(matches!(err, UpstreamError::NotFound(_)));
    assert_eq!(client.credentials().current_index(), 0);
    rpc.assert_all().await;
}

#[tokio::test]
async fn test_malformed_input_never_reaches_provider() {
    let rpc = RpcMockBuilder::new().await;
    let client = client_for(&rpc, &["key-a"]);

    assert!(matches!(client.balance("0x1234").await, Err(UpstreamError::InvalidRequest(_))));
    assert!(matches!(client.transaction("nothex").await, Err(UpstreamError::InvalidRequest(_))));
}
