use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use super::state::{GateState, IngestionGate};
use crate::{
    metrics,
    store::TransactionStore,
    types::TransactionRecord,
    upstream::ChainProvider,
};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick was still running.
    Skipped,
    /// The gate is SUSPENDED; nothing was fetched.
    Suspended,
    /// The latest block was already ingested.
    NoNewBlock { block: u64 },
    Ingested { block: u64, transactions: usize, dropped: usize, suspended: bool },
    /// Fetch or store failure. State is unchanged and the next tick retries.
    Failed { reason: String },
}

impl TickOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Suspended => "suspended",
            Self::NoNewBlock { .. } => "no_new_block",
            Self::Ingested { .. } => "ingested",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Fixed-interval fetch-and-gate loop.
///
/// Each tick fetches the latest block, upserts its transactions into the store and only then
/// appends their hashes to the pending stack. Ticks never overlap: a tick that finds the
/// previous one still running returns [`TickOutcome::Skipped`] instead of queueing.
pub struct Ingestor {
    provider: Arc<dyn ChainProvider>,
    store: Arc<dyn TransactionStore>,
    gate: Arc<IngestionGate>,
    interval: Duration,
    store_input_data: bool,
    tick_lock: Mutex<()>,
}

impl Ingestor {
    #[must_use]
    pub fn new(
        provider: Arc<dyn ChainProvider>,
        store: Arc<dyn TransactionStore>,
        gate: Arc<IngestionGate>,
        interval: Duration,
        store_input_data: bool,
    ) -> Self {
        Self { provider, store, gate, interval, store_input_data, tick_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn gate(&self) -> &Arc<IngestionGate> {
        &self.gate
    }

    /// Runs one fetch-and-gate cycle. Errors are logged and reported, never propagated.
    pub async fn tick(&self) -> TickOutcome {
        let Ok(_guard) = self.tick_lock.try_lock() else {
            debug!("previous ingestion tick still running, skipping");
            metrics::record_tick("skipped");
            return TickOutcome::Skipped;
        };

        let outcome = self.run_cycle().await;
        metrics::record_tick(outcome.as_str());

        let status = self.gate.status();
        metrics::record_gate(status.length, status.state == GateState::Suspended);

        outcome
    }

    async fn run_cycle(&self) -> TickOutcome {
        if self.gate.is_suspended() {
            debug!("ingestion suspended, waiting for pending stack to drain");
            return TickOutcome::Suspended;
        }

        let latest = match self.provider.latest_block_number().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "failed to fetch latest block number");
                return TickOutcome::Failed { reason: e.to_string() };
            }
        };

        if self.gate.last_block() == Some(latest) {
            debug!(block = latest, "no new block");
            return TickOutcome::NoNewBlock { block: latest };
        }

        let block = match self.provider.block_with_transactions(latest).await {
            Ok(block) => block,
            Err(e) => {
                warn!(block = latest, error = %e, "failed to fetch block");
                return TickOutcome::Failed { reason: e.to_string() };
            }
        };

        let observed_at = Utc::now();
        let block_timestamp = block.timestamp.map(|t| t.to::<u64>());
        let records: Vec<TransactionRecord> = block
            .transactions
            .iter()
            .map(|tx| {
                TransactionRecord::from_rpc(
                    tx,
                    latest,
                    block_timestamp,
                    self.store_input_data,
                    observed_at,
                )
            })
            .collect();

        if let Err(e) = self.store.upsert_many(&records).await {
            warn!(block = latest, error = %e, "failed to persist block transactions");
            return TickOutcome::Failed { reason: e.to_string() };
        }

        let hashes: Vec<String> = records.into_iter().map(|r| r.hash).collect();
        let transactions = hashes.len();

        #[cfg(feature = "verbose-logging")]
        tracing::trace!(block = latest, hashes = ?hashes, "appending hashes to pending stack");

        let appended = self.gate.append_block(latest, hashes);
        metrics::record_ingested(transactions, appended.dropped);

        if appended.dropped > 0 {
            debug!(dropped = appended.dropped, "pending stack full, dropped oldest hashes");
        }
        if appended.suspended {
            warn!(
                length = appended.length,
                "pending stack reached capacity, ingestion suspended"
            );
        }

        info!(block = latest, transactions, pending = appended.length, "ingested block");

        TickOutcome::Ingested {
            block: latest,
            transactions,
            dropped: appended.dropped,
            suspended: appended.suspended,
        }
    }

    /// Starts the tick loop, stopping when `shutdown_rx` fires.
    ///
    /// A tick in progress when shutdown arrives runs to completion, so its store writes land
    /// before the loop exits.
    pub fn start_with_shutdown(
        self: Arc<Self>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(interval_ms = self.interval.as_millis(), "ingestion loop started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.tick().await;
                    }
                    _ = shutdown_rx.recv() => {
                        info!("ingestion loop received shutdown signal");
                        break;
                    }
                }
            }
        })
    }
}
