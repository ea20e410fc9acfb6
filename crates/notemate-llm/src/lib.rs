//! Hosted chat-completion models

mod client;
mod json;
mod types;

pub use client::OpenAiCompatClient;
pub use json::extract_json_object;
pub use types::{ChatModel, ChatRequest, ChatTurn, LlmError, TurnRole};
