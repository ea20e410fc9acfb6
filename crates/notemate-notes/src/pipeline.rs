//! Sequential note pipeline

use crate::error::NoteError;
use crate::image::ImageSearch;
use crate::stage::{check_input, Stage};
use crate::stages::{FormatStage, ImageSearchStage, SummaryStage, TopicStage, WriteStage};
use crate::state::{
    PipelineState, IMAGE_URL, PAGE_ID, PAGE_TITLE, SUMMARY, TOPIC, WRITE_ERROR, WRITE_SUCCESS,
};
use crate::store::NoteStore;
use notemate_core::Config;
use notemate_llm::ChatModel;
use serde::Serialize;
use std::sync::Arc;

/// Result of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteOutcome {
    pub summary: String,
    pub topic: String,
    pub image_url: String,
    pub write_success: bool,
    pub page_id: String,
    pub page_title: String,
    pub block_count: usize,
    pub error: Option<String>,
}

impl NoteOutcome {
    fn from_state(state: &PipelineState) -> Self {
        Self {
            summary: state.text(SUMMARY).to_string(),
            topic: state.text(TOPIC).to_string(),
            image_url: state.text(IMAGE_URL).to_string(),
            write_success: state.flag(WRITE_SUCCESS),
            page_id: state.text(PAGE_ID).to_string(),
            page_title: state.text(PAGE_TITLE).to_string(),
            block_count: state.blocks().len(),
            error: Some(state.text(WRITE_ERROR))
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        }
    }

    /// Browser link to the written page
    pub fn page_url(&self) -> Option<String> {
        if self.page_id.is_empty() {
            return None;
        }
        Some(format!("https://notion.so/{}", self.page_id.replace('-', "")))
    }
}

/// Ordered list of stages run against one state
pub struct NotePipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl NotePipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// summary -> topic -> image search -> format -> write
    pub fn standard(
        config: &Config,
        model: Arc<dyn ChatModel>,
        images: Option<Arc<dyn ImageSearch>>,
        store: Arc<dyn NoteStore>,
    ) -> Self {
        let mut pipeline = Self::new();
        pipeline.register(Box::new(SummaryStage::new(model.clone(), &config.note_model)));
        pipeline.register(Box::new(TopicStage::new(model.clone(), &config.note_model)));
        pipeline.register(Box::new(ImageSearchStage::new(images)));
        pipeline.register(Box::new(FormatStage::new(
            model,
            &config.note_model,
            config.formatter_temperature,
        )));
        pipeline.register(Box::new(WriteStage::new(store)));
        pipeline
    }

    pub fn register(&mut self, stage: Box<dyn Stage>) {
        self.stages.push(stage);
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order, stopping at the first error
    pub async fn run(&self, state: &mut PipelineState) -> Result<(), NoteError> {
        for stage in &self.stages {
            check_input(stage.as_ref(), state)?;
            tracing::debug!(stage = stage.name(), "running stage");
            stage.run(state).await?;
        }
        Ok(())
    }

    /// Summarize `chat_history` and write it to `page_id`, or to the first
    /// page found when none is given.
    ///
    /// Model failures abort the run. A failed write is reported through
    /// `NoteOutcome::error` with `write_success == false`.
    pub async fn create_note(
        &self,
        chat_history: &str,
        page_id: Option<&str>,
    ) -> Result<NoteOutcome, NoteError> {
        if chat_history.trim().is_empty() {
            return Err(NoteError::EmptyHistory);
        }

        let mut state = PipelineState::new(chat_history, page_id);
        self.run(&mut state).await?;
        Ok(NoteOutcome::from_state(&state))
    }
}

impl Default for NotePipeline {
    fn default() -> Self {
        Self::new()
    }
}
