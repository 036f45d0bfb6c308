//! HTTP surface for ethpulse.
//!
//! Handlers are thin: they extract and validate request shapes, call into
//! [`ethpulse_core`] components held in [`AppState`], and map failures through
//! [`error::ApiError`].

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod prometheus;
pub mod router;

use ethpulse_core::{config::AppConfig, runtime::EthpulseComponents};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

pub use router::create_router;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub components: EthpulseComponents,
    pub config: Arc<AppConfig>,
    /// `None` when metrics are disabled; `/metrics` then renders an empty body.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn new(
        components: EthpulseComponents,
        config: Arc<AppConfig>,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        Self { components, config, prometheus }
    }
}
