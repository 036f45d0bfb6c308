//! Mock Ethereum JSON-RPC provider.
//!
//! Each credential is an API key that becomes a path segment (`{url}/{key}`), so one mockito
//! server can answer differently per credential.

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

pub struct RpcMockBuilder {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl RpcMockBuilder {
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// URL template routing every credential to this server.
    #[must_use]
    pub fn url_template(&self) -> String {
        format!("{}/{{key}}", self.server.url())
    }

    fn method_matcher(method: &str) -> Matcher {
        Matcher::Regex(format!(r#""method"\s*:\s*"{method}""#))
    }

    fn reply(&mut self, key: &str, matcher: Matcher, result: &Value) -> &mut Self {
        let mock = self
            .server
            .mock("POST", format!("/{key}").as_str())
            .match_body(matcher)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string())
            .expect_at_least(1)
            .create();

        self.mocks.push(mock);
        self
    }

    /// Every request made with `key` gets HTTP 429.
    pub fn mock_rate_limited(&mut self, key: &str) -> &mut Self {
        let mock = self
            .server
            .mock("POST", format!("/{key}").as_str())
            .with_status(429)
            .with_body("Too Many Requests")
            .expect_at_least(1)
            .create();

        self.mocks.push(mock);
        self
    }

    /// Every request made with `key` gets a JSON-RPC `-32005` limit error.
    pub fn mock_rpc_limit_error(&mut self, key: &str) -> &mut Self {
        let mock = self
            .server
            .mock("POST", format!("/{key}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": { "code": -32005, "message": "daily request count exceeded" }
                })
                .to_string(),
            )
            .expect_at_least(1)
            .create();

        self.mocks.push(mock);
        self
    }

    pub fn mock_block_number(&mut self, key: &str, block_number: u64) -> &mut Self {
        self.reply(
            key,
            Self::method_matcher("eth_blockNumber"),
            &json!(format!("0x{block_number:x}")),
        )
    }

    pub fn mock_get_block_by_number(
        &mut self,
        key: &str,
        block_number: u64,
        block: &Value,
    ) -> &mut Self {
        let matcher = Matcher::AllOf(vec![
            Self::method_matcher("eth_getBlockByNumber"),
            Matcher::Regex(format!(r#""params"\s*:\s*\["0x{block_number:x}""#)),
        ]);
        self.reply(key, matcher, block)
    }

    pub fn mock_get_balance(&mut self, key: &str, wei: u128) -> &mut Self {
        self.reply(key, Self::method_matcher("eth_getBalance"), &json!(format!("0x{wei:x}")))
    }

    /// `tx` may be `Value::Null` to simulate an unknown hash.
    pub fn mock_get_transaction(&mut self, key: &str, hash: &str, tx: &Value) -> &mut Self {
        let matcher = Matcher::AllOf(vec![
            Self::method_matcher("eth_getTransactionByHash"),
            Matcher::Regex(hash.to_string()),
        ]);
        self.reply(key, matcher, tx)
    }

    /// Panics if any registered mock was hit fewer times than expected.
    pub async fn assert_all(&self) {
        for mock in &self.mocks {
            mock.assert_async().await;
        }
    }
}

/// Builds a block object the way providers return it with full transactions.
pub struct BlockResponseBuilder {
    number: u64,
    timestamp: u64,
    transactions: Vec<Value>,
}

impl BlockResponseBuilder {
    #[must_use]
    pub fn new(number: u64) -> Self {
        Self { number, timestamp: 1_700_000_000 + number * 12, transactions: Vec::new() }
    }

    #[must_use]
    pub fn with_transaction(mut self, tx: Value) -> Self {
        self.transactions.push(tx);
        self
    }

    /// Adds `count` simple value transfers with hashes derived from the block number.
    #[must_use]
    pub fn with_transfers(mut self, count: usize) -> Self {
        for i in 0..count {
            let hash = format!("0x{:064x}", self.number * 1000 + i as u64);
            self.transactions.push(super::test_helpers::create_test_transaction(
                &hash,
                self.number,
                "0x00000000000000000000000000000000000000a1",
                Some("0x00000000000000000000000000000000000000b2"),
                1_000_000_000_000_000_000,
            ));
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Value {
        json!({
            "number": format!("0x{:x}", self.number),
            "hash": format!("0x{:064x}", self.number),
            "parentHash": format!("0x{:064x}", self.number.saturating_sub(1)),
            "timestamp": format!("0x{:x}", self.timestamp),
            "transactions": self.transactions,
        })
    }
}
