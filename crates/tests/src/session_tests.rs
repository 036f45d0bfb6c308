//! Sealed provider-credential sessions.

use ethpulse_core::{
    auth::{AuthError, CredentialCipher, InMemorySessionStore, SessionManager, SessionStore},
    config::AuthConfig,
};
use std::{sync::Arc, time::Duration};

const SECRET: &str = "integration-test-secret-0123456789abcdef";

fn manager(store: Arc<dyn SessionStore>, secret: &str) -> SessionManager {
    let config = AuthConfig { encryption_key: Some(secret.to_string()), ..Default::default() };
    SessionManager::from_config(&config, store).expect("cipher builds")
}

#[tokio::test]
async fn test_connect_resolve_disconnect() {
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let sessions = manager(store, SECRET);

    let session_id = sessions.connect("user-1", "OpenAI", " sk-live-123 ").await.unwrap();

    let resolved = sessions.resolve(&session_id).await.unwrap().expect("session exists");
    assert_eq!(resolved.provider, "openai");
    assert_eq!(resolved.api_key, "sk-live-123");

    let status = sessions.status("user-1").await;
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].session_id, session_id);

    assert!(sessions.disconnect(&session_id).await);
    assert!(!sessions.disconnect(&session_id).await);
    assert!(sessions.resolve(&session_id).await.unwrap().is_none());
    assert!(sessions.status("user-1").await.is_empty());
}

#[tokio::test]
async fn test_stored_blob_never_holds_plaintext() {
    let store = Arc::new(InMemorySessionStore::new());
    let sessions = manager(store.clone(), SECRET);

    let session_id = sessions.connect("user-1", "claude", "sk-ant-plaintext").await.unwrap();
    let stored = store.get(&session_id).await.expect("stored");

    assert!(!stored.encrypted_credential.contains("sk-ant-plaintext"));
    assert!(!format!("{stored:?}").contains(&stored.encrypted_credential));
}

#[tokio::test]
async fn test_connect_rejects_bad_input() {
    let sessions = manager(Arc::new(InMemorySessionStore::new()), SECRET);

    assert!(matches!(
        sessions.connect("  ", "openai", "key").await,
        Err(AuthError::InvalidRequest(_))
    ));
    assert!(matches!(
        sessions.connect("user", "mistral", "key").await,
        Err(AuthError::UnknownProvider(_))
    ));
    assert!(matches!(
        sessions.connect("user", "gemini", "   ").await,
        Err(AuthError::InvalidCredential(_))
    ));
}

#[tokio::test]
async fn test_key_change_surfaces_decryption_failure() {
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let before = manager(store.clone(), SECRET);
    let session_id = before.connect("user-1", "groq", "gsk-1").await.unwrap();

    let after = manager(store, "a-completely-different-secret-value-000");
    assert!(matches!(after.resolve(&session_id).await, Err(AuthError::Decryption)));
}

#[tokio::test]
async fn test_idle_sessions_are_purged() {
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let cipher = CredentialCipher::from_secret(SECRET).unwrap();
    let sessions = SessionManager::new(store, cipher, Duration::ZERO);

    sessions.connect("user-1", "openai", "sk-1").await.unwrap();
    sessions.connect("user-2", "openai", "sk-2").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert_eq!(sessions.purge_expired().await, 2);
    assert!(sessions.status("user-1").await.is_empty());
}

#[tokio::test]
async fn test_sessions_are_scoped_per_user() {
    let sessions = manager(Arc::new(InMemorySessionStore::new()), SECRET);

    sessions.connect("user-1", "openai", "sk-1").await.unwrap();
    sessions.connect("user-1", "claude", "sk-2").await.unwrap();
    sessions.connect("user-2", "gemini", "sk-3").await.unwrap();

    assert_eq!(sessions.status("user-1").await.len(), 2);
    assert_eq!(sessions.status("user-2").await.len(), 1);
    assert!(sessions.status("user-3").await.is_empty());
}
