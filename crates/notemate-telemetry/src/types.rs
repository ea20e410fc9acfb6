//! Run record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One note pipeline run, appended to `runs.jsonl`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRunRecord {
    pub run_id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub page_id: String,
    #[serde(default)]
    pub page_title: String,
    #[serde(default)]
    pub write_success: bool,
    #[serde(default)]
    pub block_count: usize,
    #[serde(default)]
    pub error: Option<String>,
}
