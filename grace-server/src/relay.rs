//! Relay service — stateless translator between a client transcript and the upstream provider
//!
//! Each call:
//! - rejects an empty transcript without touching the network
//! - fails fast with a configuration error when no credential was supplied at start-up
//! - otherwise makes exactly one upstream call with `[system prompt] + transcript`
//!
//! Holds only read-only data, so one instance is shared by every in-flight request.
//! Conversation content is never logged.

use std::sync::Arc;
use std::time::Instant;

use grace_core::{
    create_upstream, ChatBackend, GraceConfig, GraceError, PersonaConfig, RelayError, Turn,
};
use uuid::Uuid;

pub struct RelayService {
    system_prompt: Arc<str>,
    max_tokens: u32,
    backend: Option<Arc<dyn ChatBackend>>,
}

impl RelayService {
    pub fn new(persona: &PersonaConfig, backend: Option<Arc<dyn ChatBackend>>) -> Self {
        Self {
            system_prompt: Arc::from(persona.render_system_prompt()),
            max_tokens: persona.style.max_reply_tokens,
            backend,
        }
    }

    /// Build the relay from process configuration and the environment credential.
    ///
    /// Refuses to build without a credential unless `http.allow_missing_credential`
    /// is set, in which case every relay call fails with `RelayError::Configuration`.
    pub fn from_config(config: &GraceConfig) -> Result<Self, GraceError> {
        let backend: Option<Arc<dyn ChatBackend>> = match config.provider.credential() {
            Some(credential) => {
                let upstream = create_upstream(&config.provider, credential)?;
                tracing::info!(
                    provider = config.provider.kind.as_str(),
                    model = config.provider.model(),
                    "Upstream provider configured"
                );
                Some(Arc::new(upstream) as Arc<dyn ChatBackend>)
            }
            None if config.http.allow_missing_credential => {
                tracing::warn!(
                    env = config.provider.api_key_env(),
                    "No provider credential configured — relay will answer every chat with a configuration error"
                );
                None
            }
            None => {
                return Err(GraceError::MissingCredential(
                    config.provider.api_key_env().to_string(),
                ))
            }
        };

        Ok(Self::new(&config.persona, backend))
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.backend.as_ref().map(|b| b.name())
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Forward `turns` (in the order received) behind the system prompt and return the reply text.
    pub async fn relay(&self, turns: &[Turn]) -> Result<String, RelayError> {
        let request_id = Uuid::new_v4();

        if turns.is_empty() {
            tracing::debug!(%request_id, "Rejected empty transcript");
            return Err(RelayError::BadRequest("messages must not be empty".into()));
        }

        let backend = match &self.backend {
            Some(b) => b,
            None => {
                tracing::warn!(%request_id, "Relay called without a provider credential");
                return Err(RelayError::Configuration(
                    "no provider credential configured".into(),
                ));
            }
        };

        let start = Instant::now();
        let result = backend
            .complete(&self.system_prompt, turns, self.max_tokens)
            .await;
        let took_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::info!(
                %request_id,
                provider = backend.name(),
                turns = turns.len(),
                took_ms,
                "Relayed chat"
            ),
            Err(e) => tracing::warn!(
                %request_id,
                provider = backend.name(),
                turns = turns.len(),
                took_ms,
                kind = e.kind(),
                "Relay failed"
            ),
        }

        result
    }
}
