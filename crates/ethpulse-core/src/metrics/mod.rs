//! Metric names and recording helpers.
//!
//! Recording goes through the `metrics` facade. The server installs a Prometheus recorder and
//! serves it on `/metrics`; without a recorder every call is a no-op, which keeps unit tests
//! free of global setup.

use metrics::{counter, gauge};

use crate::upstream::UpstreamError;

pub const INGESTED_TRANSACTIONS_TOTAL: &str = "ethpulse_ingested_transactions_total";
pub const INGEST_TICKS_TOTAL: &str = "ethpulse_ingest_ticks_total";
pub const PENDING_DROPPED_TOTAL: &str = "ethpulse_pending_dropped_total";
pub const PENDING_STACK_LENGTH: &str = "ethpulse_pending_stack_length";
pub const INGEST_GATE_SUSPENDED: &str = "ethpulse_ingest_gate_suspended";
pub const CREDENTIAL_ROTATIONS_TOTAL: &str = "ethpulse_credential_rotations_total";
pub const UPSTREAM_ERRORS_TOTAL: &str = "ethpulse_upstream_errors_total";
pub const TRANSLATIONS_TOTAL: &str = "ethpulse_translations_total";
pub const QUERY_REJECTIONS_TOTAL: &str = "ethpulse_query_rejections_total";
pub const QUERIES_TOTAL: &str = "ethpulse_queries_total";

/// Counts one ingestion tick by its outcome label.
pub fn record_tick(outcome: &'static str) {
    counter!(INGEST_TICKS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_ingested(transactions: usize, dropped: usize) {
    counter!(INGESTED_TRANSACTIONS_TOTAL).increment(transactions as u64);
    if dropped > 0 {
        counter!(PENDING_DROPPED_TOTAL).increment(dropped as u64);
    }
}

/// Publishes the current stack length and gate state.
#[allow(clippy::cast_precision_loss)]
pub fn record_gate(length: usize, suspended: bool) {
    gauge!(PENDING_STACK_LENGTH).set(length as f64);
    gauge!(INGEST_GATE_SUSPENDED).set(if suspended { 1.0 } else { 0.0 });
}

pub fn record_credential_rotation() {
    counter!(CREDENTIAL_ROTATIONS_TOTAL).increment(1);
}

pub fn record_upstream_error(error: &UpstreamError) {
    counter!(UPSTREAM_ERRORS_TOTAL, "kind" => error.as_metric_str()).increment(1);
}

/// Counts a completed translation by the method that produced it.
pub fn record_translation(method: String) {
    counter!(TRANSLATIONS_TOTAL, "method" => method).increment(1);
}

pub fn record_query(accepted: bool) {
    if accepted {
        counter!(QUERIES_TOTAL).increment(1);
    } else {
        counter!(QUERY_REJECTIONS_TOTAL).increment(1);
    }
}
