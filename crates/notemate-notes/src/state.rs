//! Per-run state shared by pipeline stages

use serde_json::Value;
use std::collections::HashMap;

pub const CHAT_HISTORY: &str = "chat_history";
pub const PAGE_ID: &str = "notion_page_id";
pub const SUMMARY: &str = "summary";
pub const TOPIC: &str = "topic";
pub const IMAGE_URL: &str = "image_url";
pub const BLOCKS: &str = "notion_blocks";
pub const WRITE_SUCCESS: &str = "notion_write_success";
pub const PAGE_TITLE: &str = "notion_page_title";
pub const WRITE_ERROR: &str = "notion_write_error";

/// Flat key-value state: each stage reads its predecessor's key and writes
/// its own. Created per invocation and dropped afterwards.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    values: HashMap<String, Value>,
}

impl PipelineState {
    pub fn new(chat_history: impl Into<String>, page_id: Option<&str>) -> Self {
        let mut state = Self::default();
        state.set(CHAT_HISTORY, chat_history.into());
        state.set(PAGE_ID, page_id.unwrap_or_default());
        state
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// String value of `key`, empty when absent or not a string
    pub fn text(&self, key: &str) -> &str {
        self.values.get(key).and_then(Value::as_str).unwrap_or("")
    }

    pub fn flag(&self, key: &str) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn blocks(&self) -> &[Value] {
        self.values
            .get(BLOCKS)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Target page, `None` when the run should pick the first page found
    pub fn page_id(&self) -> Option<&str> {
        Some(self.text(PAGE_ID)).filter(|id| !id.is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
