//! Provider credential sessions.
//!
//! A user connects an LLM provider key and receives an opaque session id. The key is sealed
//! with AES-256-GCM ([`crypto`]) before it reaches the injected [`SessionStore`]
//! ([`sessions`]); only [`SessionManager::resolve`] ever sees the plaintext again, at the point
//! of use.
//!
//! Resolution rules used by the translation endpoint:
//!
//! - unknown session id: `Ok(None)`, the request continues without a session credential
//! - stored blob that fails to decrypt: [`AuthError::Decryption`], surfaced as an auth failure

pub mod crypto;
pub mod sessions;

pub use crypto::CredentialCipher;
pub use sessions::{AuthSession, InMemorySessionStore, SessionStore, SessionSummary};

use chrono::{DateTime, Utc};
use std::{fmt, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{config::AuthConfig, nl2sql::ProviderKind};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Credential encryption failed: {0}")]
    Encryption(String),

    #[error("Stored credential could not be decrypted")]
    Decryption,
}

/// A decrypted credential, ready for one provider call.
#[derive(Clone)]
pub struct ResolvedCredential {
    pub provider: String,
    pub api_key: String,
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    cipher: CredentialCipher,
    session_ttl: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        cipher: CredentialCipher,
        session_ttl: Duration,
    ) -> Self {
        Self { store, cipher, session_ttl }
    }

    /// Builds a manager over `store` using the configured encryption key, or an ephemeral key
    /// when none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Encryption`] if the cipher cannot be created.
    pub fn from_config(
        config: &AuthConfig,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, AuthError> {
        let cipher = match config.encryption_key.as_deref() {
            Some(secret) => CredentialCipher::from_secret(secret)?,
            None => {
                warn!("no auth.encryption_key configured, sessions will not survive a restart");
                CredentialCipher::ephemeral()?
            }
        };

        Ok(Self::new(store, cipher, Duration::from_secs(config.session_ttl_seconds)))
    }

    /// Seals `api_key` and opens a session for `user_id`. Returns the new session id.
    ///
    /// # Errors
    ///
    /// Rejects blank user ids and keys and providers the translator does not support.
    pub async fn connect(
        &self,
        user_id: &str,
        provider: &str,
        api_key: &str,
    ) -> Result<String, AuthError> {
        if user_id.trim().is_empty() {
            return Err(AuthError::InvalidRequest("userId is required".to_string()));
        }

        let kind = provider
            .parse::<ProviderKind>()
            .map_err(|_| AuthError::UnknownProvider(provider.to_string()))?;

        if api_key.trim().is_empty() {
            return Err(AuthError::InvalidCredential("apiKey is empty".to_string()));
        }

        let now = Utc::now();
        let session = AuthSession {
            session_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            provider: kind.as_str().to_string(),
            encrypted_credential: self.cipher.encrypt(api_key.trim())?,
            created_at: now,
            last_used_at: now,
        };
        let session_id = session.session_id.clone();

        self.store.put(session).await;
        info!(user_id, provider = kind.as_str(), "auth session connected");

        Ok(session_id)
    }

    /// Removes the session. Returns whether it existed.
    pub async fn disconnect(&self, session_id: &str) -> bool {
        let removed = self.store.delete(session_id).await;
        if let Some(ref session) = removed {
            info!(
                user_id = %session.user_id,
                provider = %session.provider,
                "auth session disconnected"
            );
        }
        removed.is_some()
    }

    pub async fn status(&self, user_id: &str) -> Vec<SessionSummary> {
        self.store.list_for_user(user_id).await.iter().map(SessionSummary::from).collect()
    }

    /// Decrypts the session's credential and marks the session used.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Decryption`] when the stored blob cannot be opened.
    pub async fn resolve(
        &self,
        session_id: &str,
    ) -> Result<Option<ResolvedCredential>, AuthError> {
        let Some(session) = self.store.get(session_id).await else {
            debug!("unknown session id, continuing without session credential");
            return Ok(None);
        };

        let api_key = self.cipher.decrypt(&session.encrypted_credential).inspect_err(|_| {
            warn!(user_id = %session.user_id, "session credential failed to decrypt");
        })?;

        if !self.store.touch(session_id, Utc::now()).await {
            debug!("session disconnected while resolving");
        }

        Ok(Some(ResolvedCredential { provider: session.provider, api_key }))
    }

    /// Drops sessions idle for longer than the configured TTL.
    pub async fn purge_expired(&self) -> usize {
        let ttl = chrono::Duration::from_std(self.session_ttl).unwrap_or(chrono::Duration::MAX);
        let idle_since = Utc::now().checked_sub_signed(ttl).unwrap_or(DateTime::<Utc>::MIN_UTC);

        let removed = self.store.expire(idle_since).await;
        if removed > 0 {
            info!(removed, "purged idle auth sessions");
        }
        removed
    }

    /// Runs [`Self::purge_expired`] every `interval` until shutdown.
    pub fn start_purger(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.purge_expired().await;
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("session purger received shutdown signal");
                        break;
                    }
                }
            }
        })
    }
}
