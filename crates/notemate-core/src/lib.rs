//! Configuration, conversation model and prompt templates

mod config;
mod conversation;
pub mod prompts;

pub use config::{Config, ConfigError};
pub use conversation::{Conversation, Message, Role, DEFAULT_HISTORY_TURNS};
