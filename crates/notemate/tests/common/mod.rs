#![allow(dead_code)]

use async_trait::async_trait;
use notemate_index::Embedder;
use notemate_llm::{ChatModel, ChatRequest, LlmError};
use notemate_mcp::McpError;
use notemate_notes::{ImageSearch, NoteError, NoteStore, NotionPage};
use serde_json::Value;
use std::sync::Mutex;

pub const SUMMARY: &str = "**Title**: Managing Gastritis\n**Key Points**:\n- Avoid NSAIDs\n- Eat smaller meals";
pub const FORMATTED: &str = r#"{"blocks": [
    {"block_type": "divider", "content": ""},
    {"block_type": "heading_1", "content": "Managing Gastritis"},
    {"block_type": "bulleted_list_item", "content": "Avoid NSAIDs"},
    {"block_type": "bookmark", "content": "https://img.example/stomach.jpg"}
], "reasoning": "topic heading and key points"}"#;

/// Answers each pipeline prompt by recognising its system message
pub struct PipelineModel {
    pub formatter_reply: Option<String>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl PipelineModel {
    pub fn new() -> Self {
        Self {
            formatter_reply: Some(FORMATTED.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_broken_formatter() -> Self {
        Self {
            formatter_reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for PipelineModel {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        let system = request
            .messages
            .first()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request);

        if system.contains("note-taker") {
            Ok(SUMMARY.to_string())
        } else if system.contains("main topic") {
            Ok("\"Managing Gastritis\"".to_string())
        } else if system.contains("Notion pages") {
            self.formatter_reply
                .clone()
                .ok_or_else(|| LlmError::Other("formatter offline".to_string()))
        } else {
            Ok("I don't know based on the available information.".to_string())
        }
    }
}

pub struct FixedImage(pub Option<String>);

#[async_trait]
impl ImageSearch for FixedImage {
    async fn search(&self, _query: &str) -> Result<Option<String>, NoteError> {
        Ok(self.0.clone())
    }
}

/// In-memory page store recording every append
#[derive(Default)]
pub struct MemoryStore {
    pub pages: Vec<NotionPage>,
    pub appended: Mutex<Vec<(String, Vec<Value>)>>,
    /// When set, appends fail with this tool error message
    pub append_error: Option<String>,
}

impl MemoryStore {
    pub fn with_pages(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(id, title)| NotionPage {
                    id: id.to_string(),
                    title: title.to_string(),
                })
                .collect(),
            appended: Mutex::new(Vec::new()),
            append_error: None,
        }
    }

    pub fn rejecting_appends(pages: &[(&str, &str)], message: &str) -> Self {
        Self {
            append_error: Some(message.to_string()),
            ..Self::with_pages(pages)
        }
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn list_pages(&self) -> Result<Vec<NotionPage>, NoteError> {
        Ok(self.pages.clone())
    }

    async fn append_blocks(&self, page_id: &str, blocks: &[Value]) -> Result<(), NoteError> {
        if let Some(message) = &self.append_error {
            return Err(NoteError::Mcp(McpError::Tool {
                tool: "API-patch-block-children".to_string(),
                message: message.clone(),
            }));
        }
        self.appended
            .lock()
            .unwrap()
            .push((page_id.to_string(), blocks.to_vec()));
        Ok(())
    }
}

/// Counts a fixed vocabulary; deterministic and model-free
pub struct VocabEmbedder;

const VOCAB: &[&str] = &["stomach", "acid", "ginger", "knee", "exercise", "sleep"];

impl Embedder for VocabEmbedder {
    fn embed(&mut self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                VOCAB.iter().map(|w| t.matches(w).count() as f32).collect()
            })
            .collect())
    }
}
