//! Read-only query surface over the durable store.

pub mod gateway;
pub mod sql_guard;

pub use gateway::{QueryError, QueryGateway, QueryResponse};
pub use sql_guard::{ensure_select, SqlValidationError};
