//! Mock LLM provider endpoints in each vendor's response shape.

use mockito::{Mock, Server, ServerGuard};
use serde_json::json;

pub struct LlmMockServer {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl LlmMockServer {
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    /// Base URL to put in `nl2sql.endpoints`.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    fn push(&mut self, mock: Mock) -> &mut Self {
        self.mocks.push(mock);
        self
    }

    /// OpenAI-compatible chat completion (also used by Groq).
    pub fn mock_chat_completion(&mut self, content: &str) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "chatcmpl-test",
                    "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
                })
                .to_string(),
            )
            .expect_at_least(1)
            .create();
        self.push(mock)
    }

    pub fn mock_claude_message(&mut self, text: &str) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/v1/messages")
            .match_header("anthropic-version", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "msg_test",
                    "type": "message",
                    "content": [{ "type": "text", "text": text }]
                })
                .to_string(),
            )
            .expect_at_least(1)
            .create();
        self.push(mock)
    }

    pub fn mock_gemini_content(&mut self, model: &str, text: &str) -> &mut Self {
        let mock = self
            .server
            .mock("POST", format!("/v1beta/models/{model}:generateContent").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
                })
                .to_string(),
            )
            .expect_at_least(1)
            .create();
        self.push(mock)
    }

    /// Chat completion endpoint answering with an HTTP error.
    pub fn mock_chat_failure(&mut self, status: usize) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/v1/chat/completions")
            .with_status(status)
            .with_body(json!({ "error": { "message": "upstream failure" } }).to_string())
            .expect_at_least(1)
            .create();
        self.push(mock)
    }

    /// Chat completion endpoint that must never be called.
    pub fn refuse_chat_completion(&mut self) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .expect(0)
            .create();
        self.push(mock)
    }

    pub async fn assert_all(&self) {
        for mock in &self.mocks {
            mock.assert_async().await;
        }
    }
}
