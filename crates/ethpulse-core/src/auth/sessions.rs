use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

/// A provider credential held on behalf of a user.
///
/// Only the sealed blob is stored. The plaintext exists only inside
/// [`SessionManager::resolve`](super::SessionManager::resolve).
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub session_id: String,
    pub user_id: String,
    pub provider: String,
    pub encrypted_credential: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("provider", &self.provider)
            .field("created_at", &self.created_at)
            .field("last_used_at", &self.last_used_at)
            .finish_non_exhaustive()
    }
}

/// Secret-free view of a session for status responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl From<&AuthSession> for SessionSummary {
    fn from(session: &AuthSession) -> Self {
        Self {
            session_id: session.session_id.clone(),
            provider: session.provider.clone(),
            created_at: session.created_at,
            last_used_at: session.last_used_at,
        }
    }
}

/// Session persistence. Implementations may be in-process or backed by an external cache.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Option<AuthSession>;

    /// Inserts or replaces by `session_id`.
    async fn put(&self, session: AuthSession);

    async fn delete(&self, session_id: &str) -> Option<AuthSession>;

    /// Sets `last_used_at` on an existing session. Never creates one.
    ///
    /// Returns `false` when the session is gone.
    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> bool;

    /// Removes sessions last used before `idle_since` and returns how many were removed.
    async fn expire(&self, idle_since: DateTime<Utc>) -> usize;

    async fn list_for_user(&self, user_id: &str) -> Vec<AuthSession>;
}

/// In-process [`SessionStore`].
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, AuthSession>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<AuthSession> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    async fn put(&self, session: AuthSession) {
        self.sessions.insert(session.session_id.clone(), session);
    }

    async fn delete(&self, session_id: &str) -> Option<AuthSession> {
        self.sessions.remove(session_id).map(|(_, session)| session)
    }

    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(mut session) => {
                session.last_used_at = at;
                true
            }
            None => false,
        }
    }

    async fn expire(&self, idle_since: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.last_used_at >= idle_since);
        before.saturating_sub(self.sessions.len())
    }

    async fn list_for_user(&self, user_id: &str) -> Vec<AuthSession> {
        let mut sessions: Vec<_> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by_key(|session| session.created_at);
        sessions
    }
}
