use anyhow::Result;
use axum::serve;
use ethpulse_core::{config::AppConfig, runtime::EthpulseRuntime};
use server::{create_router, prometheus, AppState};
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system based on the configuration.
///
/// `RUST_LOG=debug` and `RUST_LOG=trace` expand to crate-scoped filters; any other value is used
/// verbatim. Without `RUST_LOG`, `logging.level` applies to the workspace crates.
fn init_logging(config: &AppConfig) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(env_filter) if env_filter == "debug" || env_filter == "trace" => EnvFilter::new(
            format!("warn,ethpulse_core={env_filter},server={env_filter},tower_http={env_filter}"),
        ),
        Ok(_) => EnvFilter::try_from_env("RUST_LOG")
            .unwrap_or_else(|_| EnvFilter::new("warn,ethpulse_core=debug,server=debug")),
        Err(_) => {
            let level = &config.logging.level;
            EnvFilter::new(format!("warn,ethpulse_core={level},server={level}"))
        }
    };

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config =
        AppConfig::load().map_err(|e| anyhow::anyhow!("Configuration loading failed: {e}"))?;

    init_logging(&config);
    info!("Starting ethpulse");
    debug!(
        network = %config.upstream.network,
        credentials = config.upstream.api_keys.len(),
        bind_port = config.server.bind_port,
        ingestion_enabled = config.ingest.enabled,
        "Configuration loaded"
    );

    let addr = config.socket_addr().map_err(|e| anyhow::anyhow!(e))?;

    let prometheus = config.metrics.enabled.then(prometheus::prometheus_handle);

    // Store or credential failures abort here, before the listener is bound.
    let runtime = EthpulseRuntime::builder()
        .with_config(config.clone())
        .build()
        .await
        .map_err(|e| anyhow::anyhow!("Startup failed: {e}"))?;

    let state = AppState::new(runtime.components().clone(), Arc::new(config), prometheus);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "HTTP server listening");

    if let Err(e) = serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!(error = %e, "Server error occurred");
    }

    runtime.shutdown().await;
    info!("Server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                () = std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, draining requests");
}
