//! Upstream blockchain provider access.
//!
//! - [`credentials`]: ordered credential pool with an atomic round-robin cursor
//! - [`http_client`]: single-attempt HTTP transport with timeouts
//! - [`client`]: [`FailoverClient`], which rotates credentials on rate limits
//!
//! Consumers depend on the [`ChainProvider`] capability rather than the concrete client so
//! ingestion and handlers can run against scripted providers in tests.

pub mod client;
pub mod credentials;
pub mod errors;
pub mod http_client;

pub use client::FailoverClient;
pub use credentials::{Credential, CredentialSet, RotationOutcome};
pub use errors::{RpcErrorCategory, UpstreamError};

use alloy_primitives::U256;
use async_trait::async_trait;

use crate::types::RpcBlock;

/// Block, transaction and balance lookups against the chain.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Latest block number known to the provider.
    async fn latest_block_number(&self) -> Result<u64, UpstreamError>;

    /// Block `number` with full transaction objects. A missing block is
    /// [`UpstreamError::NotFound`].
    async fn block_with_transactions(&self, number: u64) -> Result<RpcBlock, UpstreamError>;

    /// Raw provider transaction object. A missing transaction is [`UpstreamError::NotFound`].
    async fn transaction(&self, hash: &str) -> Result<serde_json::Value, UpstreamError>;

    /// Balance in wei at the latest block.
    async fn balance(&self, address: &str) -> Result<U256, UpstreamError>;
}
