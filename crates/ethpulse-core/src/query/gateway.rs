use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::sql_guard::{self, SqlValidationError};
use crate::{
    metrics,
    store::{SqlRow, SqlValue, StoreError, TransactionStore},
};

/// Largest integer magnitude a JSON consumer can hold in an IEEE-754 double without loss.
const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] SqlValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Store(StoreError::Validation(_)))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub row_count: usize,
    #[serde(rename = "results")]
    pub rows: Vec<Map<String, Value>>,
}

/// Validated read-only SQL execution against the durable store.
pub struct QueryGateway {
    store: Arc<dyn TransactionStore>,
}

impl QueryGateway {
    #[must_use]
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    /// Executes a single SELECT statement and shapes rows into JSON objects.
    ///
    /// Non-SELECT input is rejected before the store is touched.
    ///
    /// # Errors
    ///
    /// [`QueryError::Validation`] for rejected statements, [`QueryError::Store`] when the engine
    /// fails.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResponse, QueryError> {
        if let Err(e) = sql_guard::ensure_select(sql) {
            metrics::record_query(false);
            warn!(error = %e, "rejected query");
            return Err(e.into());
        }

        let rows = self.store.execute_read_only(sql, params).await?;
        metrics::record_query(true);
        debug!(rows = rows.len(), "query executed");

        let rows: Vec<_> = rows.into_iter().map(row_to_json).collect();
        Ok(QueryResponse { row_count: rows.len(), rows })
    }
}

fn row_to_json(row: SqlRow) -> Map<String, Value> {
    row.columns.into_iter().map(|(name, value)| (name, value_to_json(value))).collect()
}

/// Integers outside the double-safe range become decimal strings.
fn value_to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&i) => {
            Value::Number(i.into())
        }
        SqlValue::Integer(i) => Value::String(i.to_string()),
        SqlValue::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
    }
}
