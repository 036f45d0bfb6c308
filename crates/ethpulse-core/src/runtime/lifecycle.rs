//! Background tasks and ordered shutdown.

use parking_lot::Mutex;
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::{builder::EthpulseRuntimeBuilder, EthpulseComponents};
use crate::config::AppConfig;

/// Owns the components and their background tasks.
///
/// Shutdown order: stop the ingestion timer, let an in-flight tick finish its store writes,
/// stop the session purger, then close the store.
pub struct EthpulseRuntime {
    components: EthpulseComponents,
    shutdown_tx: broadcast::Sender<()>,
    config: AppConfig,
    ingest_task: Mutex<Option<JoinHandle<()>>>,
    purge_task: Mutex<Option<JoinHandle<()>>>,
    shutdown_initiated: AtomicBool,
}

impl EthpulseRuntime {
    #[must_use]
    pub fn builder() -> EthpulseRuntimeBuilder {
        EthpulseRuntimeBuilder::new()
    }

    pub(super) fn new(
        components: EthpulseComponents,
        shutdown_tx: broadcast::Sender<()>,
        config: AppConfig,
        start_ingestion: bool,
        start_session_purger: bool,
    ) -> Self {
        let ingest_task = start_ingestion.then(|| {
            let handle =
                components.ingestor().clone().start_with_shutdown(shutdown_tx.subscribe());
            debug!("ingestion task started");
            handle
        });

        let purge_task = start_session_purger.then(|| {
            let handle = components.sessions().clone().start_purger(
                Duration::from_secs(config.auth.purge_interval_seconds),
                shutdown_tx.subscribe(),
            );
            debug!("session purge task started");
            handle
        });

        Self {
            components,
            shutdown_tx,
            config,
            ingest_task: Mutex::new(ingest_task),
            purge_task: Mutex::new(purge_task),
            shutdown_initiated: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn components(&self) -> &EthpulseComponents {
        &self.components
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Upper bound on waiting for an in-flight tick: every credential timing out once plus
    /// the retry delays between them.
    fn tick_drain_timeout(&self) -> Duration {
        let attempts =
            u32::try_from(self.config.upstream.api_keys.len().max(1)).unwrap_or(u32::MAX);
        (self.config.upstream_timeout() + self.config.retry_delay()) * attempts * 2 +
            Duration::from_secs(5)
    }

    /// Stops background work and closes the store. Later calls are no-ops.
    pub async fn shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("shutdown already initiated, ignoring duplicate call");
            return;
        }

        info!("initiating ethpulse runtime shutdown");
        if self.shutdown_tx.send(()).is_err() {
            debug!("no background task was listening for shutdown");
        }

        let ingest_task = self.ingest_task.lock().take();
        if let Some(task) = ingest_task {
            match tokio::time::timeout(self.tick_drain_timeout(), task).await {
                Ok(Ok(())) => debug!("ingestion task completed"),
                Ok(Err(e)) => error!(error = %e, "ingestion task failed"),
                Err(_) => warn!("ingestion task did not finish in time, closing store anyway"),
            }
        }

        let purge_task = self.purge_task.lock().take();
        if let Some(task) = purge_task {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!(error = %e, "session purge task failed");
                }
            }
        }

        self.components.store().close().await;

        info!("ethpulse runtime shutdown complete");
    }
}
