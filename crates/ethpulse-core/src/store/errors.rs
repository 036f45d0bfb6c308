use thiserror::Error;

use crate::query::SqlValidationError;

/// Durable store errors.
///
/// `Open` and `Initialize` are fatal at startup. `Database` and `Decode` are per-operation
/// failures surfaced to the caller while the process keeps serving.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Failed to initialize schema: {0}")]
    Initialize(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Validation(#[from] SqlValidationError),

    #[error("Failed to decode column '{column}': {reason}")]
    Decode { column: String, reason: String },

    #[error("Value for '{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: u64 },

    #[error("Store is closed")]
    Closed,
}
