//! # Ethpulse Core
//!
//! Core library for the Ethpulse Ethereum transaction tracker.
//!
//! This crate provides the components behind the HTTP surface:
//!
//! - **[`upstream`]**: Provider pool with round-robin credential rotation on rate limits and the
//!   failover JSON-RPC client used for block, transaction and balance lookups.
//!
//! - **[`store`]**: Durable `SQLite` transaction store with upsert-by-hash semantics, range and
//!   address queries, aggregate statistics and guarded read-only SQL execution.
//!
//! - **[`ingest`]**: Fetch-and-gate ingestion loop feeding both the durable store and the bounded
//!   pending stack, plus the legacy LIFO accessor that drives resume.
//!
//! - **[`nl2sql`]**: Natural-language to SQL translation over several LLM providers with a
//!   deterministic rule-based fallback.
//!
//! - **[`query`]**: SELECT-only query gateway and the shared SQL guard.
//!
//! - **[`auth`]**: Encrypted provider-credential sessions behind an injectable session store.
//!
//! - **[`runtime`]**: Component wiring, background tasks and ordered shutdown.
//!
//! ## Data Flow
//!
//! ```text
//!        ┌──────────────┐   latest block    ┌──────────────────┐
//!  tick ►│   Ingestor   │ ────────────────► │  FailoverClient  │──► RPC credential N
//!        └──────┬───────┘                   └──────────────────┘
//!               │ records                         ▲ rotate on 429
//!        ┌──────▼───────┐   hashes   ┌────────────┴─────┐
//!        │ SqliteStore  │            │  IngestionGate   │◄── pop_n (PendingQueue)
//!        └──────▲───────┘            │ stack + ENABLED/ │
//!               │ SELECT             │    SUSPENDED     │
//!        ┌──────┴───────┐            └──────────────────┘
//!        │ QueryGateway │◄── Translator (LLM ─► rule-based fallback)
//!        └──────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod nl2sql;
pub mod query;
pub mod runtime;
pub mod store;
pub mod types;
pub mod upstream;
