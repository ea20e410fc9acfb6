//! The five note pipeline stages

use crate::blocks::{fallback_blocks, parse_formatter_reply, to_notion_blocks};
use crate::error::NoteError;
use crate::image::ImageSearch;
use crate::stage::Stage;
use crate::state::{
    PipelineState, BLOCKS, CHAT_HISTORY, IMAGE_URL, PAGE_ID, PAGE_TITLE, SUMMARY, TOPIC,
    WRITE_ERROR, WRITE_SUCCESS,
};
use crate::store::{NoteStore, NotionPage};
use async_trait::async_trait;
use notemate_core::prompts;
use notemate_llm::{ChatModel, ChatRequest};
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_TOPIC: &str = "Untitled Note";
const SPECIFIED_PAGE: &str = "Specified Page";

/// `chat_history` -> `summary`
pub struct SummaryStage {
    model: Arc<dyn ChatModel>,
    model_name: String,
}

impl SummaryStage {
    pub fn new(model: Arc<dyn ChatModel>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }
}

#[async_trait]
impl Stage for SummaryStage {
    fn name(&self) -> &str {
        "summary"
    }

    fn requires(&self) -> &str {
        CHAT_HISTORY
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), NoteError> {
        let prompt = prompts::summary_prompt(state.text(CHAT_HISTORY));
        let request = ChatRequest::new(&self.model_name)
            .system(prompt.system)
            .user(prompt.user);

        let summary = self.model.complete(request).await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(NoteError::EmptyOutput("summary"));
        }
        state.set(SUMMARY, summary);
        Ok(())
    }
}

/// First line of a model reply with wrapping quotes removed
fn clean_topic(raw: &str) -> &str {
    raw.trim()
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
}

/// `summary` -> `topic`
pub struct TopicStage {
    model: Arc<dyn ChatModel>,
    model_name: String,
}

impl TopicStage {
    pub fn new(model: Arc<dyn ChatModel>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }
}

#[async_trait]
impl Stage for TopicStage {
    fn name(&self) -> &str {
        "topic"
    }

    fn requires(&self) -> &str {
        SUMMARY
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), NoteError> {
        let prompt = prompts::topic_prompt(state.text(SUMMARY));
        let request = ChatRequest::new(&self.model_name)
            .system(prompt.system)
            .user(prompt.user)
            .max_tokens(32);

        let reply = self.model.complete(request).await?;
        let topic = clean_topic(&reply);
        if topic.is_empty() {
            return Err(NoteError::EmptyOutput("topic"));
        }
        state.set(TOPIC, topic);
        Ok(())
    }
}

/// `topic` -> `image_url`. Never fails the run: any problem leaves the URL empty.
pub struct ImageSearchStage {
    search: Option<Arc<dyn ImageSearch>>,
}

impl ImageSearchStage {
    /// `None` disables image lookup (no API key configured)
    pub fn new(search: Option<Arc<dyn ImageSearch>>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Stage for ImageSearchStage {
    fn name(&self) -> &str {
        "image_search"
    }

    fn requires(&self) -> &str {
        TOPIC
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), NoteError> {
        let topic = state.text(TOPIC).to_string();

        let url = match &self.search {
            None => {
                tracing::info!("image search not configured, skipping");
                String::new()
            }
            Some(_) if topic.is_empty() => String::new(),
            Some(search) => match search.search(&topic).await {
                Ok(Some(url)) => url,
                Ok(None) => {
                    tracing::info!(topic = %topic, "no image found");
                    String::new()
                }
                Err(e) => {
                    tracing::warn!(topic = %topic, error = %e, "image search failed");
                    String::new()
                }
            },
        };

        state.set(IMAGE_URL, url);
        Ok(())
    }
}

/// `summary` (+ `topic`, `image_url`) -> `notion_blocks`
pub struct FormatStage {
    model: Arc<dyn ChatModel>,
    model_name: String,
    temperature: f32,
}

impl FormatStage {
    pub fn new(model: Arc<dyn ChatModel>, model_name: impl Into<String>, temperature: f32) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            temperature,
        }
    }

    /// Notion blocks from the formatter model, or why they are unusable
    async fn model_blocks(
        &self,
        topic: &str,
        summary: &str,
        image_url: &str,
        timestamp: &str,
    ) -> Result<Vec<Value>, String> {
        let prompt = prompts::formatter_prompt(topic, summary, image_url, timestamp);
        let request = ChatRequest::new(&self.model_name)
            .system(prompt.system)
            .user(prompt.user)
            .temperature(self.temperature)
            .json();

        let reply = self.model.complete(request).await.map_err(|e| e.to_string())?;
        let blocks = parse_formatter_reply(&reply).map_err(|e| e.to_string())?;
        // blocks that cannot be rendered (bad bookmarks, unknown types) are dropped here
        let notion = to_notion_blocks(&blocks);
        if notion.is_empty() {
            return Err(format!("formatter returned no usable blocks ({} parsed)", blocks.len()));
        }
        Ok(notion)
    }
}

#[async_trait]
impl Stage for FormatStage {
    fn name(&self) -> &str {
        "format"
    }

    fn requires(&self) -> &str {
        SUMMARY
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), NoteError> {
        let topic = match state.text(TOPIC) {
            "" => DEFAULT_TOPIC,
            t => t,
        };
        let summary = state.text(SUMMARY);
        let image_url = state.text(IMAGE_URL);
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let notion = match self.model_blocks(topic, summary, image_url, &timestamp).await {
            Ok(notion) => notion,
            Err(reason) => {
                tracing::warn!(reason = %reason, "formatter failed, using fallback layout");
                to_notion_blocks(&fallback_blocks(topic, summary, image_url, &timestamp))
            }
        };

        tracing::debug!(blocks = notion.len(), "formatted note");
        state.set(BLOCKS, Value::Array(notion));
        Ok(())
    }
}

fn same_page(a: &str, b: &str) -> bool {
    a.replace('-', "").eq_ignore_ascii_case(&b.replace('-', ""))
}

/// `notion_blocks` -> `notion_write_success`, `notion_page_title`, `notion_page_id`.
///
/// Write failures are recorded in state rather than aborting the run.
pub struct WriteStage {
    store: Arc<dyn NoteStore>,
}

impl WriteStage {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    async fn resolve_target(&self, requested: Option<&str>) -> Result<NotionPage, NoteError> {
        match requested {
            Some(id) => {
                let title = match self.store.list_pages().await {
                    Ok(pages) => pages
                        .into_iter()
                        .find(|p| same_page(&p.id, id))
                        .map(|p| p.title),
                    Err(e) => {
                        tracing::debug!(error = %e, "page lookup failed");
                        None
                    }
                };
                Ok(NotionPage {
                    id: id.to_string(),
                    title: title.unwrap_or_else(|| SPECIFIED_PAGE.to_string()),
                })
            }
            None => self
                .store
                .list_pages()
                .await?
                .into_iter()
                .next()
                .ok_or(NoteError::NoPages),
        }
    }

    async fn write(&self, state: &PipelineState) -> Result<NotionPage, NoteError> {
        let blocks = state.blocks();
        if blocks.is_empty() {
            return Err(NoteError::NoBlocks);
        }
        let page = self.resolve_target(state.page_id()).await?;
        self.store.append_blocks(&page.id, blocks).await?;
        Ok(page)
    }
}

#[async_trait]
impl Stage for WriteStage {
    fn name(&self) -> &str {
        "write"
    }

    fn requires(&self) -> &str {
        BLOCKS
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), NoteError> {
        match self.write(state).await {
            Ok(page) => {
                tracing::info!(page_id = %page.id, title = %page.title, "note written");
                state.set(WRITE_SUCCESS, true);
                state.set(PAGE_ID, page.id);
                state.set(PAGE_TITLE, page.title);
            }
            Err(e) => {
                tracing::warn!(error = %e, "note write failed");
                state.set(WRITE_SUCCESS, false);
                state.set(WRITE_ERROR, e.to_string());
            }
        }
        Ok(())
    }
}
