pub mod conversation;
pub mod fallback;
pub mod transcript;
pub mod transport;

pub use conversation::{
    Conversation, IgnoreReason, Phase, Snapshot, SubmitOutcome, DEFAULT_GREETING, QUICK_ACTIONS,
};
pub use fallback::{canned_reply, classify, FallbackCategory};
pub use transcript::Transcript;
pub use transport::{HttpRelayTransport, RelayTransport, TransportError};
