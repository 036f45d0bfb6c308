//! Durable transaction storage.
//!
//! [`TransactionStore`] is the capability the ingestion loop, query gateway and HTTP handlers
//! depend on; [`SqliteStore`] is the `SQLite` implementation.

pub mod errors;
pub mod sqlite;

pub use errors::StoreError;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{TransactionRecord, TransactionStats};

/// A single column value as returned by the engine, before any JSON shaping.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// One result row as ordered `(column, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRow {
    pub columns: Vec<(String, SqlValue)>,
}

impl SqlRow {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns.iter().find(|(name, _)| name == column).map(|(_, value)| value)
    }
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Creates the schema if absent. Safe to call repeatedly.
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Inserts or replaces each record by `hash`, one statement per record.
    ///
    /// Records before a failing one stay committed; the failing record's error is returned.
    async fn upsert_many(&self, records: &[TransactionRecord]) -> Result<usize, StoreError>;

    /// Most recently inserted records first.
    async fn query_recent(&self, limit: i64) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Records where `address` is the sender or the receiver, most recent first.
    async fn query_by_address(
        &self,
        address: &str,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>, StoreError>;

    async fn stats(&self) -> Result<TransactionStats, StoreError>;

    /// Runs a single SELECT statement with positional parameters.
    async fn execute_read_only(&self, sql: &str, params: &[Value])
        -> Result<Vec<SqlRow>, StoreError>;

    /// Releases all resources. Idempotent.
    async fn close(&self);
}
