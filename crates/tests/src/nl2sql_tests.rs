//! Translation against mock vendor endpoints.
//!
//! The translator is pointed at a mockito server through `nl2sql.endpoints`, so each vendor's
//! request path and response shape is exercised without network access.

use ethpulse_core::{
    config::Nl2SqlConfig,
    nl2sql::{SessionCredential, TranslationRequest, Translator, RULE_BASED_METHOD},
};

use crate::mock_infrastructure::LlmMockServer;

const QUESTION: &str = "show the five largest transfers";

fn translator_for(llm: &LlmMockServer, default: Option<(&str, &str)>) -> Translator {
    let mut config = Nl2SqlConfig::default();
    for provider in ["openai", "claude", "gemini", "groq"] {
        config.endpoints.insert(provider.to_string(), llm.url());
    }
    if let Some((provider, key)) = default {
        config.default_provider = Some(provider.to_string());
        config.default_api_key = Some(key.to_string());
    }
    config.timeout_seconds = 5;
    Translator::new(config, 1000).expect("translator builds")
}

#[tokio::test]
async fn test_default_provider_fenced_select_is_accepted() {
    let mut llm = LlmMockServer::new().await;
    llm.mock_chat_completion("```sql\nSELECT * FROM transactions ORDER BY value DESC LIMIT 5;\n```");

    let translation = translator_for(&llm, Some(("openai", "sk-test")))
        .translate(TranslationRequest { text: QUESTION, ..Default::default() })
        .await;

    assert_eq!(translation.sql_query, "SELECT * FROM transactions ORDER BY value DESC LIMIT 5;");
    assert_eq!(translation.method, "openai");
    llm.assert_all().await;
}

#[tokio::test]
async fn test_non_select_reply_falls_back_to_rules() {
    let mut llm = LlmMockServer::new().await;
    llm.mock_chat_completion("DELETE FROM transactions;");

    let translation = translator_for(&llm, Some(("openai", "sk-test")))
        .translate(TranslationRequest { text: "latest 3 transactions", ..Default::default() })
        .await;

    assert_eq!(translation.method, RULE_BASED_METHOD);
    assert!(translation.sql_query.starts_with("SELECT"));
    assert!(!translation.sql_query.contains("DELETE"));
    llm.assert_all().await;
}

#[tokio::test]
async fn test_provider_http_error_falls_back_to_rules() {
    let mut llm = LlmMockServer::new().await;
    llm.mock_chat_failure(500);

    let translation = translator_for(&llm, Some(("groq", "gsk-test")))
        .translate(TranslationRequest { text: QUESTION, ..Default::default() })
        .await;

    assert_eq!(translation.method, RULE_BASED_METHOD);
    llm.assert_all().await;
}

#[tokio::test]
async fn test_session_credential_selects_claude() {
    let mut llm = LlmMockServer::new().await;
    llm.mock_claude_message("SELECT COUNT(*) FROM transactions;");

    let translation = translator_for(&llm, None)
        .translate(TranslationRequest {
            text: "how many transactions are stored",
            provider: Some("claude"),
            model: None,
            credential: Some(SessionCredential { provider: "claude", api_key: "sk-ant-test" }),
        })
        .await;

    assert_eq!(translation.sql_query, "SELECT COUNT(*) FROM transactions;");
    assert_eq!(translation.method, "claude");
    llm.assert_all().await;
}

#[tokio::test]
async fn test_gemini_uses_requested_model_path() {
    let mut llm = LlmMockServer::new().await;
    llm.mock_gemini_content("gemini-test-model", "SELECT hash FROM transactions LIMIT 1;");

    let translation = translator_for(&llm, None)
        .translate(TranslationRequest {
            text: "any one hash",
            provider: Some("gemini"),
            model: Some("gemini-test-model"),
            credential: Some(SessionCredential { provider: "gemini", api_key: "AIza-test" }),
        })
        .await;

    assert_eq!(translation.sql_query, "SELECT hash FROM transactions LIMIT 1;");
    assert_eq!(translation.method, "gemini");
    llm.assert_all().await;
}

#[tokio::test]
async fn test_session_credential_wins_over_default() {
    let mut llm = LlmMockServer::new().await;
    llm.mock_claude_message("SELECT 1;");

    // The default would be openai, which has no mock and would fail.
    let translation = translator_for(&llm, Some(("openai", "sk-default")))
        .translate(TranslationRequest {
            text: QUESTION,
            provider: Some("claude"),
            model: None,
            credential: Some(SessionCredential { provider: "claude", api_key: "sk-ant-session" }),
        })
        .await;

    assert_eq!(translation.method, "claude");
}

#[tokio::test]
async fn test_no_provider_uses_address_rule() {
    let llm = LlmMockServer::new().await;
    let address = "0x00000000000000000000000000000000000000a1";

    let translation = translator_for(&llm, None)
        .translate(TranslationRequest {
            text: "Transactions for 0x00000000000000000000000000000000000000A1",
            ..Default::default()
        })
        .await;

    assert_eq!(translation.method, RULE_BASED_METHOD);
    assert!(translation.sql_query.contains(&format!("from_address = '{address}'")));
    assert!(translation.sql_query.contains(&format!("to_address = '{address}'")));
}

#[tokio::test]
async fn test_unknown_provider_name_falls_back_to_rules() {
    let llm = LlmMockServer::new().await;

    let translation = translator_for(&llm, None)
        .translate(TranslationRequest {
            text: "latest transactions",
            provider: Some("mystery"),
            model: None,
            credential: Some(SessionCredential { provider: "mystery", api_key: "key" }),
        })
        .await;

    assert_eq!(translation.method, RULE_BASED_METHOD);
}

#[tokio::test]
async fn test_session_credential_not_sent_to_other_provider() {
    let mut llm = LlmMockServer::new().await;
    llm.refuse_chat_completion();

    let translation = translator_for(&llm, None)
        .translate(TranslationRequest {
            text: "latest transactions",
            provider: Some("openai"),
            model: None,
            credential: Some(SessionCredential { provider: "claude", api_key: "sk-ant-session" }),
        })
        .await;

    assert_eq!(translation.method, RULE_BASED_METHOD);
    llm.assert_all().await;
}

#[tokio::test]
async fn test_mismatched_session_credential_uses_default_provider() {
    let mut llm = LlmMockServer::new().await;
    llm.mock_claude_message("SELECT 2;");

    let translation = translator_for(&llm, Some(("claude", "sk-ant-default")))
        .translate(TranslationRequest {
            text: QUESTION,
            provider: Some("openai"),
            model: None,
            credential: Some(SessionCredential { provider: "claude", api_key: "sk-ant-session" }),
        })
        .await;

    assert_eq!(translation.sql_query, "SELECT 2;");
    assert_eq!(translation.method, "claude");
    llm.assert_all().await;
}

#[tokio::test]
async fn test_session_credential_used_without_provider_hint() {
    let mut llm = LlmMockServer::new().await;
    llm.mock_claude_message("SELECT 3;");

    let translation = translator_for(&llm, None)
        .translate(TranslationRequest {
            text: QUESTION,
            provider: None,
            model: None,
            credential: Some(SessionCredential { provider: "anthropic", api_key: "sk-ant-session" }),
        })
        .await;

    assert_eq!(translation.method, "claude");
    llm.assert_all().await;
}
