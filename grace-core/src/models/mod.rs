pub mod chat;
pub mod turn;

pub use chat::{ChatReply, ChatRequest, ErrorBody};
pub use turn::{Role, Turn};
