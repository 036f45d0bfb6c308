//! Reusable mocks for integration tests.
//!
//! - `RpcMockBuilder`: mockito-backed JSON-RPC provider, one path per credential
//! - `LlmMockServer`: mockito-backed OpenAI / Claude / Gemini endpoints
//! - `ScriptedChain`: in-process `ChainProvider` for ingestion scenarios
//!
//! ```ignore
//! use tests::mock_infrastructure::{RpcMockBuilder, test_config};
//!
//! let mut rpc = RpcMockBuilder::new().await;
//! rpc.mock_rate_limited("key-a").mock_get_balance("key-b", 42);
//! let config = test_config(&rpc.url_template(), &["key-a", "key-b"]);
//! ```

pub mod llm_mock;
pub mod rpc_mock;
pub mod test_helpers;

pub use llm_mock::LlmMockServer;
pub use rpc_mock::{BlockResponseBuilder, RpcMockBuilder};
pub use test_helpers::*;
