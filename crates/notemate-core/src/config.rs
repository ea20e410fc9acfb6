//! Application configuration: `config.json` plus environment overrides

use notemate_mcp::ServerConfig;
use notemate_telemetry::Paths;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Notion token is required (set NOTION_TOKEN)")]
    MissingNotionToken,
    #[error("no API key for the language model (set GROQ_API_KEY)")]
    MissingApiKey,
}

fn default_chat_model() -> String {
    "openai/gpt-oss-120b".to_string()
}

fn default_note_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_formatter_temperature() -> f32 {
    0.3
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_top_k() -> usize {
    5
}

fn default_history_turns() -> usize {
    crate::DEFAULT_HISTORY_TURNS
}

fn default_image_search_url() -> String {
    "https://google.serper.dev/images".to_string()
}

fn default_mcp_command() -> String {
    "npx".to_string()
}

fn default_mcp_args() -> Vec<String> {
    vec!["-y".to_string(), "@notionhq/notion-mcp-server".to_string()]
}

/// Runtime configuration.
///
/// Every field has a default so a partial `config.json` is valid. Secrets
/// are normally left out of the file and supplied through the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model answering chat questions
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model driving the note pipeline stages
    #[serde(default = "default_note_model")]
    pub note_model: String,

    /// OpenAI-compatible API root
    #[serde(default = "default_llm_base_url")]
    pub llm_base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_api_key: Option<String>,

    #[serde(default = "default_formatter_temperature")]
    pub formatter_temperature: f32,

    /// Max characters per indexed chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Conversation turns replayed into the chat prompt
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,

    #[serde(default = "default_image_search_url")]
    pub image_search_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serper_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_token: Option<String>,

    /// Executable launching the Notion tool server
    #[serde(default = "default_mcp_command")]
    pub mcp_command: String,

    #[serde(default = "default_mcp_args")]
    pub mcp_args: Vec<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            chat_model: default_chat_model(),
            note_model: default_note_model(),
            llm_base_url: default_llm_base_url(),
            llm_api_key: None,
            formatter_temperature: default_formatter_temperature(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            history_turns: default_history_turns(),
            image_search_url: default_image_search_url(),
            serper_api_key: None,
            notion_token: None,
            mcp_command: default_mcp_command(),
            mcp_args: default_mcp_args(),
        }
    }

    /// Load `config.json` from the data directory, then apply the process
    /// environment. A missing or unreadable file yields defaults.
    pub fn load(paths: &Paths) -> Self {
        let mut config = Self::from_file(&paths.config_file());
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn from_file(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::new();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
                return Self::new();
            }
        };

        match serde_json::from_str::<Config>(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed config, using defaults");
                Self::new()
            }
        }
    }

    /// Overlay values from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("NOTEMATE_CHAT_MODEL") {
            self.chat_model = v;
        }
        if let Some(v) = get("NOTEMATE_NOTE_MODEL") {
            self.note_model = v;
        }
        if let Some(v) = get("NOTEMATE_LLM_BASE_URL") {
            self.llm_base_url = v;
        }
        if let Some(v) = get("GROQ_API_KEY") {
            self.llm_api_key = Some(v);
        }
        if let Some(v) = get("SERPER_API_KEY") {
            self.serper_api_key = Some(v);
        }
        if let Some(v) = get("NOTION_TOKEN") {
            self.notion_token = Some(v);
        }
        if let Some(v) = get("NPX_EXECUTABLE_PATH") {
            self.mcp_command = v;
        }
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.llm_api_key
            .as_deref()
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Tool server definition for the Notion bridge
    pub fn mcp_server(&self) -> Result<ServerConfig, ConfigError> {
        let token = self
            .notion_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingNotionToken)?;

        let mut env = HashMap::new();
        env.insert("NOTION_TOKEN".to_string(), token.to_string());

        Ok(ServerConfig {
            name: "notion".to_string(),
            command: self.mcp_command.clone(),
            args: self.mcp_args.clone(),
            env,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
