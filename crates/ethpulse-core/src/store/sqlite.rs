use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Column, Row, Sqlite, SqlitePool, TypeInfo, ValueRef,
};
use std::str::FromStr;
use tracing::{debug, info};

use super::{SqlRow, SqlValue, StoreError, TransactionStore};
use crate::{
    config::StoreConfig,
    query::sql_guard,
    types::{TransactionRecord, TransactionStats},
};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS transactions (
    hash         TEXT PRIMARY KEY,
    block_number INTEGER NOT NULL,
    from_address TEXT NOT NULL,
    to_address   TEXT,
    value        TEXT NOT NULL,
    gas_price    TEXT NOT NULL,
    gas_limit    INTEGER NOT NULL,
    nonce        INTEGER NOT NULL,
    data         TEXT NOT NULL DEFAULT '',
    timestamp    TEXT NOT NULL,
    created_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transactions_block_number ON transactions(block_number);
CREATE INDEX IF NOT EXISTS idx_transactions_from_address ON transactions(from_address);
CREATE INDEX IF NOT EXISTS idx_transactions_to_address ON transactions(to_address);
CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions(created_at);
";

const UPSERT: &str = r"
INSERT INTO transactions (
    hash, block_number, from_address, to_address, value, gas_price,
    gas_limit, nonce, data, timestamp, created_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(hash) DO UPDATE SET
    block_number = excluded.block_number,
    from_address = excluded.from_address,
    to_address   = excluded.to_address,
    value        = excluded.value,
    gas_price    = excluded.gas_price,
    gas_limit    = excluded.gas_limit,
    nonce        = excluded.nonce,
    data         = excluded.data,
    timestamp    = excluded.timestamp,
    created_at   = excluded.created_at
";

// Non-numeric `value` strings are excluded from the mean rather than failing the query.
const STATS: &str = r"
SELECT
    COUNT(*)                     AS total_transactions,
    COUNT(DISTINCT from_address) AS unique_senders,
    COUNT(DISTINCT to_address)   AS unique_receivers,
    MIN(block_number)            AS min_block,
    MAX(block_number)            AS max_block,
    AVG(CASE WHEN value <> '' AND value NOT GLOB '*[^0-9]*'
             THEN CAST(value AS REAL) END) AS avg_value
FROM transactions
";

/// `SQLite`-backed [`TransactionStore`].
///
/// Timestamps are stored as RFC 3339 text with microsecond precision in UTC so that lexical
/// order matches chronological order.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the database cannot be opened or created.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::connect(&config.database_url, config.max_connections).await
    }

    /// Opens a pool on `database_url`, creating the file and its parent directory if missing.
    ///
    /// In-memory databases get exactly one long-lived connection, since every `SQLite`
    /// connection to `:memory:` is a separate database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the URL is invalid or the database cannot be opened.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::Open(e.to_string()))?
            .create_if_missing(true);

        let in_memory = is_in_memory(database_url);

        if !in_memory {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        StoreError::Open(format!("cannot create {}: {e}", parent.display()))
                    })?;
                }
            }
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Open(e.to_string()))?;

        info!(in_memory, "transaction store opened");

        Ok(Self { pool })
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn get_required<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, StoreError>
    where
        T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
    {
        row.try_get::<T, _>(column)
            .map_err(|e| StoreError::Decode { column: column.to_string(), reason: e.to_string() })
    }

    fn get_u64(row: &SqliteRow, column: &str) -> Result<u64, StoreError> {
        let value: i64 = Self::get_required(row, column)?;
        u64::try_from(value).map_err(|e| StoreError::Decode {
            column: column.to_string(),
            reason: format!("{value} is negative: {e}"),
        })
    }

    fn get_instant(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, StoreError> {
        let text: String = Self::get_required(row, column)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|instant| instant.with_timezone(&Utc))
            .map_err(|e| StoreError::Decode { column: column.to_string(), reason: e.to_string() })
    }

    fn row_to_record(row: &SqliteRow) -> Result<TransactionRecord, StoreError> {
        Ok(TransactionRecord {
            hash: Self::get_required(row, "hash")?,
            block_number: Self::get_u64(row, "block_number")?,
            from_address: Self::get_required(row, "from_address")?,
            to_address: Self::get_required(row, "to_address")?,
            value: Self::get_required(row, "value")?,
            gas_price: Self::get_required(row, "gas_price")?,
            gas_limit: Self::get_u64(row, "gas_limit")?,
            nonce: Self::get_u64(row, "nonce")?,
            data: Self::get_required(row, "data")?,
            timestamp: Self::get_instant(row, "timestamp")?,
            created_at: Self::get_instant(row, "created_at")?,
        })
    }

    /// Decodes a column by its runtime storage class.
    fn decode_column(row: &SqliteRow, index: usize) -> Result<SqlValue, StoreError> {
        let column_name = || row.columns()[index].name().to_string();

        let storage_class = {
            let raw = row.try_get_raw(index)?;
            if raw.is_null() {
                return Ok(SqlValue::Null);
            }
            raw.type_info().name().to_ascii_uppercase()
        };

        let decoded = match storage_class.as_str() {
            "INTEGER" | "INT" | "INT8" | "BIGINT" | "BOOLEAN" => {
                row.try_get_unchecked::<i64, _>(index).map(SqlValue::Integer)
            }
            "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
                row.try_get_unchecked::<f64, _>(index).map(SqlValue::Real)
            }
            "BLOB" => row.try_get_unchecked::<Vec<u8>, _>(index).map(SqlValue::Blob),
            _ => row.try_get_unchecked::<String, _>(index).map(SqlValue::Text),
        };

        decoded.map_err(|e| StoreError::Decode { column: column_name(), reason: e.to_string() })
    }

    fn to_sql_row(row: &SqliteRow) -> Result<SqlRow, StoreError> {
        let columns = row
            .columns()
            .iter()
            .enumerate()
            .map(|(index, column)| {
                Ok((column.name().to_string(), Self::decode_column(row, index)?))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(SqlRow { columns })
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn to_i64(field: &'static str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::OutOfRange { field, value })
}

fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Binds a JSON parameter by its JSON type.
fn bind_json<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &Value,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u.to_string())
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Initialize(e.to_string()))?;
        debug!("transaction schema ready");
        Ok(())
    }

    async fn upsert_many(&self, records: &[TransactionRecord]) -> Result<usize, StoreError> {
        self.ensure_open()?;

        for record in records {
            sqlx::query(UPSERT)
                .bind(&record.hash)
                .bind(to_i64("block_number", record.block_number)?)
                .bind(&record.from_address)
                .bind(record.to_address.as_deref())
                .bind(&record.value)
                .bind(&record.gas_price)
                .bind(to_i64("gas_limit", record.gas_limit)?)
                .bind(to_i64("nonce", record.nonce)?)
                .bind(&record.data)
                .bind(format_instant(&record.timestamp))
                .bind(format_instant(&record.created_at))
                .execute(&self.pool)
                .await?;
        }

        Ok(records.len())
    }

    async fn query_recent(&self, limit: i64) -> Result<Vec<TransactionRecord>, StoreError> {
        self.ensure_open()?;

        let rows = sqlx::query(
            "SELECT * FROM transactions ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn query_by_address(
        &self,
        address: &str,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        self.ensure_open()?;

        let address = address.to_lowercase();
        let rows = sqlx::query(
            "SELECT * FROM transactions WHERE from_address = ? OR to_address = ? \
             ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(&address)
        .bind(&address)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn stats(&self) -> Result<TransactionStats, StoreError> {
        self.ensure_open()?;

        let row = sqlx::query(STATS).fetch_one(&self.pool).await?;
        let avg: Option<f64> = Self::get_required(&row, "avg_value")?;

        Ok(TransactionStats {
            total_transactions: Self::get_required(&row, "total_transactions")?,
            unique_senders: Self::get_required(&row, "unique_senders")?,
            unique_receivers: Self::get_required(&row, "unique_receivers")?,
            min_block: Self::get_required(&row, "min_block")?,
            max_block: Self::get_required(&row, "max_block")?,
            avg_value: avg.map(|mean| format!("{mean:.0}")),
        })
    }

    async fn execute_read_only(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<SqlRow>, StoreError> {
        sql_guard::ensure_select(sql)?;
        self.ensure_open()?;

        let query = params.iter().fold(sqlx::query(sql), bind_json);
        let rows = query.fetch_all(&self.pool).await?;

        rows.iter().map(Self::to_sql_row).collect()
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("transaction store closed");
        }
    }
}
