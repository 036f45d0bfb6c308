use std::sync::Arc;

use crate::{
    auth::SessionManager,
    ingest::{IngestionGate, Ingestor, PendingQueue},
    nl2sql::Translator,
    query::QueryGateway,
    store::TransactionStore,
    upstream::ChainProvider,
};

/// Shared handles to every initialized component.
///
/// Cloning is cheap; the HTTP layer keeps a clone as its state.
#[derive(Clone)]
pub struct EthpulseComponents {
    store: Arc<dyn TransactionStore>,
    provider: Arc<dyn ChainProvider>,
    gate: Arc<IngestionGate>,
    ingestor: Arc<Ingestor>,
    pending: Arc<PendingQueue>,
    gateway: Arc<QueryGateway>,
    translator: Arc<Translator>,
    sessions: Arc<SessionManager>,
}

impl EthpulseComponents {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        store: Arc<dyn TransactionStore>,
        provider: Arc<dyn ChainProvider>,
        gate: Arc<IngestionGate>,
        ingestor: Arc<Ingestor>,
        pending: Arc<PendingQueue>,
        gateway: Arc<QueryGateway>,
        translator: Arc<Translator>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self { store, provider, gate, ingestor, pending, gateway, translator, sessions }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn TransactionStore> {
        &self.store
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn ChainProvider> {
        &self.provider
    }

    #[must_use]
    pub fn gate(&self) -> &Arc<IngestionGate> {
        &self.gate
    }

    #[must_use]
    pub fn ingestor(&self) -> &Arc<Ingestor> {
        &self.ingestor
    }

    #[must_use]
    pub fn pending(&self) -> &Arc<PendingQueue> {
        &self.pending
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<QueryGateway> {
        &self.gateway
    }

    #[must_use]
    pub fn translator(&self) -> &Arc<Translator> {
        &self.translator
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }
}
