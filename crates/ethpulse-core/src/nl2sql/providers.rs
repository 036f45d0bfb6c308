//! LLM provider adapters behind one [`LlmProvider`] capability.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::{fmt, str::FromStr, time::Duration};
use thiserror::Error;

use super::prompt::SYSTEM_PROMPT;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM network error: {0}")]
    Network(String),

    #[error("LLM HTTP error {0}: {1}")]
    Http(u16, String),

    #[error("Malformed LLM response: {0}")]
    InvalidResponse(String),

    #[error("LLM returned a non-SELECT statement")]
    NotSelect,
}

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Claude,
    Gemini,
    Groq,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Groq => "groq",
        }
    }

    #[must_use]
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Claude => "claude-3-5-haiku-latest",
            Self::Gemini => "gemini-1.5-flash",
            Self::Groq => "llama-3.1-8b-instant",
        }
    }

    #[must_use]
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Claude => "https://api.anthropic.com",
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Groq => "https://api.groq.com/openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Claude),
            "gemini" | "google" => Ok(Self::Gemini),
            "groq" => Ok(Self::Groq),
            other => Err(LlmError::UnknownProvider(other.to_string())),
        }
    }
}

/// Sends one prompt and returns the model's text reply.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Connection settings shared by every adapter.
#[derive(Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builds the adapter for `kind`.
#[must_use]
pub fn build_provider(
    kind: ProviderKind,
    client: Client,
    settings: ProviderSettings,
) -> Box<dyn LlmProvider> {
    match kind {
        ProviderKind::OpenAi | ProviderKind::Groq => {
            Box::new(ChatCompletionsProvider { kind, client, settings })
        }
        ProviderKind::Claude => Box::new(AnthropicProvider { client, settings }),
        ProviderKind::Gemini => Box::new(GeminiProvider { client, settings }),
    }
}

async fn send(request: RequestBuilder, timeout: Duration) -> Result<Value, LlmError> {
    let response = request.timeout(timeout).send().await.map_err(|e| {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            let reason = if e.is_connect() { "connection failed" } else { "request failed" };
            LlmError::Network(reason.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let cut = (0..=body.len().min(256)).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        return Err(LlmError::Http(status.as_u16(), body[..cut].to_string()));
    }

    response.json::<Value>().await.map_err(|e| LlmError::InvalidResponse(e.to_string()))
}

fn text_at(body: &Value, pointer: &str) -> Result<String, LlmError> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::InvalidResponse(format!("missing {pointer}")))
}

/// OpenAI chat completions; Groq serves the same API under its own base URL.
struct ChatCompletionsProvider {
    kind: ProviderKind,
    client: Client,
    settings: ProviderSettings,
}

#[async_trait]
impl LlmProvider for ChatCompletionsProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.settings.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
        });

        let request = self.client.post(url).bearer_auth(&self.settings.api_key).json(&body);
        let response = send(request, self.settings.timeout).await?;
        text_at(&response, "/choices/0/message/content")
    }
}

struct AnthropicProvider {
    client: Client,
    settings: ProviderSettings,
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.settings.model,
            "max_tokens": 512,
            "system": SYSTEM_PROMPT,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let request = self
            .client
            .post(url)
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body);
        let response = send(request, self.settings.timeout).await?;
        text_at(&response, "/content/0/text")
    }
}

struct GeminiProvider {
    client: Client,
    settings: ProviderSettings,
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        );
        let body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0 },
        });

        let request =
            self.client.post(url).header("x-goog-api-key", &self.settings.api_key).json(&body);
        let response = send(request, self.settings.timeout).await?;
        text_at(&response, "/candidates/0/content/parts/0/text")
    }
}
