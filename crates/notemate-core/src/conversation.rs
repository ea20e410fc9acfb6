//! Chat conversation types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Turns of history fed back into the chat prompt
pub const DEFAULT_HISTORY_TURNS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of a chat session (also the transcript line format)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    fn render(&self) -> String {
        format!("[{}] {}", self.role, self.content)
    }
}

/// Append-only message log for one chat session
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a stored transcript, keeping its order
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) -> &Message {
        self.messages.push(Message::new(role, content));
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Last `max_turns * 2` messages of any role, one `[role] text` per line
    pub fn recent_history(&self, max_turns: usize) -> String {
        let keep = max_turns.saturating_mul(2);
        let start = self.messages.len().saturating_sub(keep);
        self.messages[start..]
            .iter()
            .map(Message::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Every user and assistant message, one `[role] text` per line.
    ///
    /// System notices (ingest confirmations) are left out; an empty string
    /// means there is nothing to summarize.
    pub fn full_history(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(Message::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
