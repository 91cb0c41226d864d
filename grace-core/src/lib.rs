pub mod config;
pub mod error;
pub mod models;
pub mod persona;
pub mod provider;

pub use config::{GraceConfig, HttpConfig, ProviderConfig, ProviderKind, ServiceConfig};
pub use error::{GraceError, RelayError};
pub use models::{ChatReply, ChatRequest, ErrorBody, Role, Turn};
pub use persona::{BusinessFacts, PersonaConfig, ResponseStyle};
pub use provider::{
    create_upstream, AnthropicAdapter, ChatBackend, Credential, OpenAiCompatAdapter, Prompt,
    ProviderAdapter, UpstreamClient,
};
