//! Chat sessions persisted as JSONL transcripts

use notemate_core::{Conversation, Message, Role};
use notemate_telemetry::{append_jsonl, read_jsonl, Paths};
use std::path::PathBuf;

pub struct ChatSession {
    pub id: String,
    path: PathBuf,
    conversation: Conversation,
}

fn new_session_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..12].to_string()
}

/// Session ids name files under `sessions/`, so only `[A-Za-z0-9_-]+` is allowed
pub fn check_session_id(id: &str) -> anyhow::Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        anyhow::bail!(
            "invalid session id '{}': use letters, digits, '-' or '_'",
            id
        );
    }
    Ok(())
}

impl ChatSession {
    /// Fresh session with a random id
    pub fn create(paths: &Paths) -> Self {
        let id = new_session_id();
        Self {
            path: paths.session_file(&id),
            id,
            conversation: Conversation::new(),
        }
    }

    /// Load `id` from disk; an unknown id starts an empty session under that id
    pub fn open(paths: &Paths, id: &str) -> anyhow::Result<Self> {
        check_session_id(id)?;
        let path = paths.session_file(id);
        let messages: Vec<Message> = read_jsonl(&path)?;
        tracing::debug!(session = id, messages = messages.len(), "opened session");
        Ok(Self {
            id: id.to_string(),
            path,
            conversation: Conversation::from_messages(messages),
        })
    }

    /// Load an existing session, failing when no transcript exists
    pub fn open_existing(paths: &Paths, id: &str) -> anyhow::Result<Self> {
        check_session_id(id)?;
        if !paths.session_file(id).exists() {
            anyhow::bail!("no saved session '{}' in {}", id, paths.sessions_dir().display());
        }
        Self::open(paths, id)
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Append a message to the conversation and the transcript
    pub fn push(&mut self, role: Role, content: impl Into<String>) -> anyhow::Result<()> {
        let message = self.conversation.push(role, content);
        append_jsonl(&self.path, message)?;
        Ok(())
    }
}
