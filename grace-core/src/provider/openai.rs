use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::json;

use super::{Credential, Prompt, ProviderAdapter};
use crate::error::RelayError;

/// OpenAI-style chat completions, as served by OpenAI and Groq.
#[derive(Debug, Clone, Copy)]
pub struct OpenAiCompatAdapter {
    name: &'static str,
}

impl OpenAiCompatAdapter {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ProviderAdapter for OpenAiCompatAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn endpoint(&self, base_url: &str) -> String {
        format!("{}/chat/completions", base_url)
    }

    fn authorize(&self, request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        request.bearer_auth(credential.expose())
    }

    fn translate_request(&self, prompt: &Prompt<'_>) -> serde_json::Value {
        let mut messages = Vec::with_capacity(prompt.turns.len() + 1);
        messages.push(json!({ "role": "system", "content": prompt.system }));
        messages.extend(
            prompt
                .turns
                .iter()
                .map(|t| json!({ "role": t.role.as_str(), "content": t.content })),
        );

        let mut body = json!({
            "model": prompt.model,
            "messages": messages,
            "max_tokens": prompt.max_tokens,
        });

        if let Some(temperature) = prompt.temperature {
            body["temperature"] = json!(temperature);
        }

        body
    }

    fn translate_reply(&self, body: &[u8]) -> Result<String, RelayError> {
        let parsed: CompletionResponse = serde_json::from_slice(body)
            .map_err(|e| RelayError::UpstreamProtocol(format!("{} body: {}", self.name, e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                RelayError::UpstreamProtocol(format!("{} reply has no choices", self.name))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Turn;

    #[test]
    fn test_system_prompt_is_prepended() {
        let turns = vec![Turn::user("storm hit my roof"), Turn::assistant("Sorry to hear")];
        let body = OpenAiCompatAdapter::new("groq").translate_request(&Prompt {
            model: "llama-3.3-70b-versatile",
            system: "You are Grace.",
            turns: &turns,
            max_tokens: 500,
            temperature: Some(0.7),
        });

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "You are Grace.");
        assert_eq!(messages[1]["content"], "storm hit my roof");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(body["max_tokens"], 500);
        assert!(body["temperature"].as_f64().unwrap() > 0.69);
    }

    #[test]
    fn test_reply_from_first_choice() {
        let body = br#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Call 855-424-5911."}}]}"#;
        let reply = OpenAiCompatAdapter::new("groq").translate_reply(body).unwrap();
        assert_eq!(reply, "Call 855-424-5911.");
    }

    #[test]
    fn test_empty_choices_is_protocol_error() {
        let result = OpenAiCompatAdapter::new("openai").translate_reply(br#"{"choices":[]}"#);
        assert!(matches!(result, Err(RelayError::UpstreamProtocol(_))));
    }

    #[test]
    fn test_null_content_is_protocol_error() {
        let body = br#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let result = OpenAiCompatAdapter::new("openai").translate_reply(body);
        assert!(matches!(result, Err(RelayError::UpstreamProtocol(_))));
    }
}
