//! Natural-language to SQL translation.
//!
//! A request is sent to at most one LLM provider, picked in this order:
//!
//! 1. the caller's session credential, when it belongs to the requested provider (or no
//!    provider is requested)
//! 2. the server-wide default provider, when a default credential is configured
//! 3. none, in which case the rule-based converter answers directly
//!
//! A session credential is only ever sent to the vendor it was issued for. When the request
//! names a different provider the credential is left out and selection continues at step 2.
//!
//! Any provider failure, including a reply that is not a single SELECT, falls back to the
//! rule-based converter. The returned `method` names the path that produced the SQL.

pub mod prompt;
pub mod providers;
pub mod rules;

pub use providers::{build_provider, LlmError, LlmProvider, ProviderKind, ProviderSettings};
pub use rules::RuleBasedConverter;

use reqwest::Client;
use serde::Serialize;
use std::{fmt, time::Duration};
use tracing::{debug, warn};

use crate::{config::Nl2SqlConfig, metrics, query::sql_guard};

pub const RULE_BASED_METHOD: &str = "rule-based";

const FALLBACK_SQL: &str = "SELECT * FROM transactions ORDER BY created_at DESC LIMIT 10;";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub sql_query: String,
    /// Provider name (`openai`, `claude`, `gemini`, `groq`) or `rule-based`.
    pub method: String,
}

/// Caller-supplied translation inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslationRequest<'a> {
    pub text: &'a str,
    pub provider: Option<&'a str>,
    pub model: Option<&'a str>,
    pub credential: Option<SessionCredential<'a>>,
}

/// Decrypted provider credential from the caller's session, tied to the vendor that issued it.
#[derive(Clone, Copy)]
pub struct SessionCredential<'a> {
    pub provider: &'a str,
    pub api_key: &'a str,
}

impl fmt::Debug for SessionCredential<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential").field("provider", &self.provider).finish_non_exhaustive()
    }
}

pub struct Translator {
    client: Client,
    config: Nl2SqlConfig,
    rules: RuleBasedConverter,
}

impl Translator {
    /// # Errors
    ///
    /// Returns [`LlmError::Network`] if the HTTP client cannot be built.
    pub fn new(config: Nl2SqlConfig, max_limit: i64) -> Result<Self, LlmError> {
        let client = Client::builder()
            .use_rustls_tls()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("ethpulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|_| LlmError::Network("HTTP client build failed".to_string()))?;

        Ok(Self { client, config, rules: RuleBasedConverter::new(max_limit) })
    }

    /// Translates `request.text`. Never fails: every failure path ends in the rule-based
    /// converter.
    pub async fn translate(&self, request: TranslationRequest<'_>) -> Translation {
        let translation = match self.select_provider(&request) {
            Some(Ok(provider)) => self.translate_with(provider.as_ref(), request.text).await,
            Some(Err(e)) => {
                warn!(error = %e, "cannot build LLM provider, using rule-based conversion");
                self.rule_based(request.text)
            }
            None => self.rule_based(request.text),
        };

        metrics::record_translation(translation.method.clone());
        translation
    }

    /// Asks `provider` for SQL, falling back to the rule-based converter on any failure.
    pub async fn translate_with(&self, provider: &dyn LlmProvider, text: &str) -> Translation {
        let kind = provider.kind();

        let result = provider.complete(&prompt::build_prompt(text)).await.and_then(|reply| {
            let sql = prompt::strip_code_fences(&reply);
            sql_guard::ensure_select(&sql).map_err(|_| LlmError::NotSelect)?;
            Ok(sql)
        });

        match result {
            Ok(sql_query) => {
                debug!(provider = %kind, "LLM translation accepted");
                Translation { sql_query, method: kind.as_str().to_string() }
            }
            Err(e) => {
                warn!(provider = %kind, error = %e, "LLM translation failed, using rule-based");
                self.rule_based(text)
            }
        }
    }

    fn rule_based(&self, text: &str) -> Translation {
        let sql = self.rules.convert(text);
        let sql_query = if sql_guard::ensure_select(&sql).is_ok() {
            sql
        } else {
            FALLBACK_SQL.to_string()
        };

        Translation { sql_query, method: RULE_BASED_METHOD.to_string() }
    }

    fn select_provider(
        &self,
        request: &TranslationRequest<'_>,
    ) -> Option<Result<Box<dyn LlmProvider>, LlmError>> {
        let session = request.credential.filter(|c| !c.api_key.is_empty()).and_then(|c| {
            let wanted = request.provider.unwrap_or(c.provider);
            if same_provider(wanted, c.provider) {
                Some((c.provider, c.api_key, request.model))
            } else {
                warn!(
                    requested = wanted,
                    session_provider = c.provider,
                    "session credential belongs to another provider, not sending it"
                );
                None
            }
        });

        let (name, api_key, model) = match session {
            Some(selected) => selected,
            None => match (&self.config.default_provider, &self.config.default_api_key) {
                (Some(name), Some(key)) if !key.is_empty() => {
                    let model = request.model.or(self.config.default_model.as_deref());
                    (name.as_str(), key.as_str(), model)
                }
                _ => return None,
            },
        };

        Some(name.parse::<ProviderKind>().map(|kind| {
            let settings = ProviderSettings {
                api_key: api_key.to_string(),
                model: model.unwrap_or(kind.default_model()).to_string(),
                base_url: self
                    .config
                    .endpoints
                    .get(kind.as_str())
                    .cloned()
                    .unwrap_or_else(|| kind.default_base_url().to_string()),
                timeout: Duration::from_secs(self.config.timeout_seconds),
            };
            build_provider(kind, self.client.clone(), settings)
        }))
    }
}

/// Both names resolve to the same known vendor (`claude` and `anthropic` match).
fn same_provider(a: &str, b: &str) -> bool {
    match (a.parse::<ProviderKind>(), b.parse::<ProviderKind>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
