use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::json;

use super::{Credential, Prompt, ProviderAdapter};
use crate::error::RelayError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicAdapter;

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn endpoint(&self, base_url: &str) -> String {
        format!("{}/v1/messages", base_url)
    }

    fn authorize(&self, request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        request
            .header("x-api-key", credential.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
    }

    fn translate_request(&self, prompt: &Prompt<'_>) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = prompt
            .turns
            .iter()
            .map(|t| json!({ "role": t.role.as_str(), "content": t.content }))
            .collect();

        let mut body = json!({
            "model": prompt.model,
            "max_tokens": prompt.max_tokens,
            "system": prompt.system,
            "messages": messages,
        });

        if let Some(temperature) = prompt.temperature {
            body["temperature"] = json!(temperature);
        }

        body
    }

    fn translate_reply(&self, body: &[u8]) -> Result<String, RelayError> {
        let parsed: MessagesResponse = serde_json::from_slice(body)
            .map_err(|e| RelayError::UpstreamProtocol(format!("anthropic body: {}", e)))?;

        parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| RelayError::UpstreamProtocol("anthropic reply has no text block".into()))
    }
}
