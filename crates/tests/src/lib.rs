//! Integration tests for ethpulse.
//!
//! - `failover_tests`: credential rotation in the upstream client against a mock provider
//! - `ingestion_tests`: fetch-and-gate ticks, hysteresis and LIFO popping
//! - `nl2sql_tests`: LLM translation against mock vendor endpoints and the rule fallback
//! - `query_gateway_tests`: SELECT-only execution against an in-memory store
//! - `session_tests`: sealed credential sessions
//! - `runtime_tests`: builder validation and ordered shutdown
//! - `mock_infrastructure`: reusable mocks (JSON-RPC provider, LLM vendors, scripted chain)
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --package tests
//! ```
//!
//! Nothing here needs network access; every upstream is a local mockito server or an
//! in-process [`ChainProvider`](ethpulse_core::upstream::ChainProvider).

#[cfg(test)]
mod failover_tests;


#[cfg(test)]
mod nl2sql_tests;

#[cfg(test)]
mod query_gateway_tests;

#[cfg(test)]
mod session_tests;

#[cfg(test)]
mod runtime_tests;

/// Mock infrastructure for testing
pub mod mock_infrastructure;
