//! Upstream LLM provider seam.
//!
//! Provides a `ChatBackend` trait (what the relay calls) and a `ProviderAdapter`
//! trait (how one provider's wire schema is produced and parsed):
//! - **Anthropic** — Messages API, system prompt as a top-level field
//! - **OpenAI-compatible** — chat completions (OpenAI, Groq), system prompt as the first message
//!
//! `UpstreamClient` joins the two: one HTTP attempt per call, bounded by the
//! configured timeout, never retried.

pub mod anthropic;
pub mod openai;

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{GraceError, RelayError};
use crate::models::Turn;

pub use anthropic::AnthropicAdapter;
pub use openai::OpenAiCompatAdapter;

// ============================================================================
// Credential
// ============================================================================

/// Provider secret. Debug output is redacted and the type is not serializable.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for empty or whitespace-only values.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Provider-neutral completion request. `turns` keep the order the client sent.
#[derive(Debug, Clone, Copy)]
pub struct Prompt<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub turns: &'a [Turn],
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

/// Translation between the relay's turn sequence and one provider's schema.
pub trait ProviderAdapter: Send + Sync {
    /// Provider name for logging and health output.
    fn name(&self) -> &'static str;

    /// Full URL of the completion endpoint under `base_url`.
    fn endpoint(&self, base_url: &str) -> String;

    /// Attach authentication (and any fixed protocol headers) to the request.
    fn authorize(&self, request: RequestBuilder, credential: &Credential) -> RequestBuilder;

    /// Build the provider request body: system prompt first, then the turns in order.
    fn translate_request(&self, prompt: &Prompt<'_>) -> serde_json::Value;

    /// Extract the reply text from a successful response body.
    fn translate_reply(&self, body: &[u8]) -> Result<String, RelayError>;
}

/// Something that can turn a system prompt plus a transcript into one reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        turns: &[Turn],
        max_tokens: u32,
    ) -> Result<String, RelayError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// UpstreamClient
// ============================================================================

pub struct UpstreamClient {
    client: Client,
    adapter: Box<dyn ProviderAdapter>,
    credential: Credential,
    url: String,
    model: String,
    temperature: Option<f32>,
}

impl UpstreamClient {
    pub fn new(
        adapter: Box<dyn ProviderAdapter>,
        credential: Credential,
        base_url: &str,
        model: impl Into<String>,
        temperature: Option<f32>,
        timeout: Duration,
    ) -> Result<Self, GraceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GraceError::Other(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: adapter.endpoint(base_url),
            client,
            adapter,
            credential,
            model: model.into(),
            temperature,
        })
    }

    async fn complete_once(&self, prompt: &Prompt<'_>) -> Result<String, RelayError> {
        let body = self.adapter.translate_request(prompt);
        let request = self.client.post(&self.url).json(&body);
        let request = self.adapter.authorize(request, &self.credential);

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            // The body may echo the prompt; only the status is kept.
            return Err(RelayError::Upstream(format!(
                "{} returned HTTP {}",
                self.adapter.name(),
                status.as_u16()
            )));
        }

        let bytes = response.bytes().await?;
        self.adapter.translate_reply(&bytes)
    }
}

#[async_trait]
impl ChatBackend for UpstreamClient {
    async fn complete(
        &self,
        system: &str,
        turns: &[Turn],
        max_tokens: u32,
    ) -> Result<String, RelayError> {
        let prompt = Prompt {
            model: &self.model,
            system,
            turns,
            max_tokens,
            temperature: self.temperature,
        };

        let start = Instant::now();
        let result = self.complete_once(&prompt).await;
        let took_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::debug!(provider = self.adapter.name(), took_ms, "Upstream call succeeded"),
            Err(e) => tracing::warn!(
                provider = self.adapter.name(),
                took_ms,
                kind = e.kind(),
                error = %e,
                "Upstream call failed"
            ),
        }

        result
    }

    fn name(&self) -> &str {
        self.adapter.name()
    }
}

/// Create the upstream client selected by `[provider] kind`.
pub fn create_upstream(
    config: &ProviderConfig,
    credential: Credential,
) -> Result<UpstreamClient, GraceError> {
    let adapter: Box<dyn ProviderAdapter> = match config.kind {
        ProviderKind::Anthropic => Box::new(AnthropicAdapter),
        ProviderKind::OpenAi => Box::new(OpenAiCompatAdapter::new("openai")),
        ProviderKind::Groq => Box::new(OpenAiCompatAdapter::new("groq")),
    };

    UpstreamClient::new(
        adapter,
        credential,
        config.base_url(),
        config.model(),
        config.temperature,
        Duration::from_secs(config.timeout_seconds),
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn anthropic_client(base_url: &str, timeout: Duration) -> UpstreamClient {
        UpstreamClient::new(
            Box::new(AnthropicAdapter),
            Credential::new("test-api-key").unwrap(),
            base_url,
            "claude-test",
            None,
            timeout,
        )
        .expect("Failed to create client")
    }

    fn anthropic_reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": text }],
            "stop_reason": "end_turn"
        })
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("sk-very-secret").unwrap();
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_blank_credential_is_absent() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
    }

    #[tokio::test]
    async fn test_complete_posts_system_and_turns_and_returns_text() {
        let mock_server = MockServer::start().await;
        let client = anthropic_client(&mock_server.uri(), Duration::from_secs(5));

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(serde_json::json!({
                "model": "claude-test",
                "max_tokens": 500,
                "system": "be brief",
                "messages": [{ "role": "user", "content": "hi" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_reply("Hello!")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let reply = client
            .complete("be brief", &[Turn::user("hi")], 500)
            .await
            .expect("complete should succeed");
        assert_eq!(reply, "Hello!");
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error_without_retry() {
        let mock_server = MockServer::start().await;
        let client = anthropic_client(&mock_server.uri(), Duration::from_secs(5));

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(serde_json::json!({
                "type": "error",
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client.complete("sys", &[Turn::user("hi")], 100).await;
        match result {
            Err(RelayError::Upstream(msg)) => assert!(msg.contains("529")),
            other => panic!("Expected Upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_protocol_error() {
        let mock_server = MockServer::start().await;
        let client = anthropic_client(&mock_server.uri(), Duration::from_secs(5));

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&mock_server)
            .await;

        let result = client.complete("sys", &[Turn::user("hi")], 100).await;
        assert!(matches!(result, Err(RelayError::UpstreamProtocol(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_upstream_error() {
        let mock_server = MockServer::start().await;
        let client = anthropic_client(&mock_server.uri(), Duration::from_millis(200));

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(anthropic_reply("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let result = client.complete("sys", &[Turn::user("hi")], 100).await;
        assert!(matches!(result, Err(RelayError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_upstream_error() {
        // Port 1 is reserved and nothing listens on it.
        let client = anthropic_client("http://127.0.0.1:1", Duration::from_secs(2));
        let result = client.complete("sys", &[Turn::user("hi")], 100).await;
        assert!(matches!(result, Err(RelayError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_create_upstream_selects_groq_adapter() {
        let config = crate::config::GraceConfig::from_toml_str(
            r#"
            [provider]
            kind = "groq"
            "#,
        )
        .unwrap();
        let client =
            create_upstream(&config.provider, Credential::new("gsk-test").unwrap()).unwrap();
        assert_eq!(client.name(), "groq");
        assert_eq!(client.url, "https://api.groq.com/openai/v1/chat/completions");
    }
}
