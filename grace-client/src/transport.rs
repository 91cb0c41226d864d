//! Client side of the relay HTTP contract.

use std::time::Duration;

use async_trait::async_trait;
use grace_core::{ChatReply, ChatRequest, Turn};
use reqwest::Client;
use thiserror::Error;

/// Why a relay call produced no usable reply. All variants lead to the same
/// local fallback; they exist for logging.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relay returned status {code}: {kind}")]
    Status { code: u16, kind: String },

    #[error("Malformed relay response: {0}")]
    Malformed(String),
}

/// Sends a transcript to the relay and returns the reply text.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send(&self, turns: &[Turn]) -> Result<String, TransportError>;
}

/// `POST {url}` with `{"messages": [...]}`, expecting `{"response": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpRelayTransport {
    client: Client,
    url: String,
}

impl HttpRelayTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RelayTransport for HttpRelayTransport {
    async fn send(&self, turns: &[Turn]) -> Result<String, TransportError> {
        let request = ChatRequest {
            messages: turns.to_vec(),
        };

        let response = self.client.post(&self.url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let kind = body["error"].as_str().unwrap_or("unknown").to_string();
            return Err(TransportError::Status {
                code: status.as_u16(),
                kind,
            });
        }

        let bytes = response.bytes().await?;
        let reply: ChatReply = serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        if reply.response.trim().is_empty() {
            return Err(TransportError::Malformed("empty response".into()));
        }

        Ok(reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> HttpRelayTransport {
        HttpRelayTransport::new(format!("{}/chat", server.uri()), Duration::from_secs(5))
            .expect("Failed to create transport")
    }

    #[tokio::test]
    async fn test_send_posts_messages_and_returns_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(serde_json::json!({
                "messages": [
                    { "role": "user", "content": "hi" },
                    { "role": "assistant", "content": "hello" },
                    { "role": "user", "content": "storm?" }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "response": "Let's inspect." })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let turns = vec![
            Turn::user("hi"),
            Turn::assistant("hello"),
            Turn::user("storm?"),
        ];
        let reply = transport(&mock_server).send(&turns).await.unwrap();
        assert_eq!(reply, "Let's inspect.");
    }

    #[tokio::test]
    async fn test_error_status_is_reported_with_kind() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(502)
                    .set_body_json(serde_json::json!({ "error": "upstream_error" })),
            )
            .mount(&mock_server)
            .await;

        let result = transport(&mock_server).send(&[Turn::user("x")]).await;
        match result {
            Err(TransportError::Status { code, kind }) => {
                assert_eq!(code, 502);
                assert_eq!(kind, "upstream_error");
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_response_field_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "reply": "x" })),
            )
            .mount(&mock_server)
            .await;

        let result = transport(&mock_server).send(&[Turn::user("x")]).await;
        assert!(matches!(result, Err(TransportError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_http_error() {
        let transport =
            HttpRelayTransport::new("http://127.0.0.1:1/chat", Duration::from_secs(2)).unwrap();
        let result = transport.send(&[Turn::user("x")]).await;
        assert!(matches!(result, Err(TransportError::Http(_))));
    }
}
