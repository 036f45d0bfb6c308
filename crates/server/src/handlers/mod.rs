pub mod auth;
pub mod chain;
pub mod nl2sql;
pub mod pending;
pub mod query;
pub mod system;
pub mod transactions;
