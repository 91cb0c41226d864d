use serde::{Deserialize, Serialize};

use super::Turn;

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Turn>,
}

/// Successful relay reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// Failure body. `error` is an opaque kind slug, never provider detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { error: kind.into() }
    }
}
