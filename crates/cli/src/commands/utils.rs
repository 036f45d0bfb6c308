use ethpulse_core::{query::QueryError, store::StoreError, upstream::UpstreamError};
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Config(String),
    Io(String),
    Store(String),
    Query(String),
    Upstream(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Store(msg) => write!(f, "Store error: {msg}"),
            Self::Query(msg) => write!(f, "Query rejected: {msg}"),
            Self::Upstream(msg) => write!(f, "Upstream error: {msg}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(error: StoreError) -> Self {
        Self::Store(error.to_string())
    }
}

impl From<QueryError> for CliError {
    fn from(error: QueryError) -> Self {
        if error.is_validation() {
            Self::Query(error.to_string())
        } else {
            Self::Store(error.to_string())
        }
    }
}

impl From<UpstreamError> for CliError {
    fn from(error: UpstreamError) -> Self {
        Self::Upstream(error.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

pub fn print_success(message: &str) {
    println!("[SUCCESS] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn print_info(message: &str) {
    println!("[INFO] {message}");
}

/// Shortens long hex strings for table cells: `0x1234…cdef`.
pub fn abbreviate(value: &str, keep: usize) -> String {
    if !value.is_ascii() || value.len() <= keep * 2 + 3 {
        return value.to_string();
    }
    format!("{}…{}", &value[..keep + 2], &value[value.len() - keep..])
}
