//! Builder wiring the components in dependency order.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{lifecycle::EthpulseRuntime, EthpulseComponents};
use crate::{
    auth::{AuthError, InMemorySessionStore, SessionManager, SessionStore},
    config::AppConfig,
    ingest::{IngestionGate, Ingestor, InvalidThreshold, PendingQueue},
    nl2sql::{LlmError, Translator},
    query::QueryGateway,
    store::{SqliteStore, StoreError, TransactionStore},
    upstream::{ChainProvider, FailoverClient, UpstreamError},
};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// The durable store could not be opened or initialized. The process must not serve.
    #[error("Store initialization failed: {0}")]
    Store(#[from] StoreError),

    #[error("Upstream initialization failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Ingestion gate: {0}")]
    Gate(#[from] InvalidThreshold),

    #[error("Translator initialization failed: {0}")]
    Translator(#[from] LlmError),

    #[error("Session manager initialization failed: {0}")]
    Auth(#[from] AuthError),
}

/// Builds an [`EthpulseRuntime`].
///
/// Store and provider can be injected, which is how tests run the full stack against an
/// in-memory database and a scripted chain.
pub struct EthpulseRuntimeBuilder {
    config: Option<AppConfig>,
    store: Option<Arc<dyn TransactionStore>>,
    provider: Option<Arc<dyn ChainProvider>>,
    session_store: Option<Arc<dyn SessionStore>>,
    start_ingestion: bool,
    start_session_purger: bool,
    shutdown_channel_capacity: usize,
}

impl Default for EthpulseRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EthpulseRuntimeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
            provider: None,
            session_store: None,
            start_ingestion: true,
            start_session_purger: true,
            shutdown_channel_capacity: 16,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn TransactionStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ChainProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Builds components without starting the ingestion loop. Ticks can still be driven
    /// manually through [`Ingestor::tick`].
    #[must_use]
    pub fn disable_ingestion(mut self) -> Self {
        self.start_ingestion = false;
        self
    }

    #[must_use]
    pub fn disable_session_purger(mut self) -> Self {
        self.start_session_purger = false;
        self
    }

    /// Validates configuration, opens the store and wires every component.
    ///
    /// Store open or schema failure aborts the build.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] for invalid configuration or any component that fails to
    /// initialize.
    pub async fn build(self) -> Result<EthpulseRuntime, RuntimeError> {
        let config = self.config.ok_or_else(|| {
            RuntimeError::ConfigValidation("No configuration provided".to_string())
        })?;

        config.validate().map_err(RuntimeError::ConfigValidation)?;

        info!(
            network = %config.upstream.network,
            credentials = config.upstream.api_keys.len(),
            stack_capacity = config.ingest.stack_capacity,
            resume_threshold = config.ingest.resume_threshold,
            "initializing ethpulse runtime"
        );

        let store: Arc<dyn TransactionStore> = match self.store {
            Some(store) => store,
            None => Arc::new(SqliteStore::open(&config.store).await?),
        };
        store.initialize().await?;
        debug!("transaction store initialized");

        let provider: Arc<dyn ChainProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(FailoverClient::from_config(&config.upstream)?),
        };
        debug!("chain provider initialized");

        let gate = Arc::new(IngestionGate::new(
            config.ingest.stack_capacity,
            config.ingest.resume_threshold,
        )?);

        let ingestor = Arc::new(Ingestor::new(
            provider.clone(),
            store.clone(),
            gate.clone(),
            config.fetch_interval(),
            config.ingest.store_input_data,
        ));

        let pending = Arc::new(PendingQueue::new(
            gate.clone(),
            config.query.pending_default,
            config.query.pending_max,
        ));

        let gateway = Arc::new(QueryGateway::new(store.clone()));

        let translator = Arc::new(Translator::new(config.nl2sql.clone(), config.query.max_limit)?);
        debug!(
            default_provider = config.nl2sql.default_provider.as_deref().unwrap_or("none"),
            "translator initialized"
        );

        let session_store: Arc<dyn SessionStore> = match self.session_store {
            Some(store) => store,
            None => Arc::new(InMemorySessionStore::new()),
        };
        let sessions = Arc::new(SessionManager::from_config(&config.auth, session_store)?);

        let components = EthpulseComponents::new(
            store, provider, gate, ingestor, pending, gateway, translator, sessions,
        );

        let (shutdown_tx, _) = broadcast::channel::<()>(self.shutdown_channel_capacity);

        let start_ingestion = self.start_ingestion && config.ingest.enabled;
        Ok(EthpulseRuntime::new(
            components,
            shutdown_tx,
            config,
            start_ingestion,
            self.start_session_purger,
        ))
    }
}
