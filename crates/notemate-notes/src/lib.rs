//! Note pipeline: summarize a conversation and publish it as a Notion note

pub mod blocks;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod stage;
pub mod stages;
pub mod state;
pub mod store;

pub use blocks::{fallback_blocks, NoteBlock};
pub use error::NoteError;
pub use image::{ImageSearch, SerperImageSearch};
pub use pipeline::{NoteOutcome, NotePipeline};
pub use stage::Stage;
pub use stages::{FormatStage, ImageSearchStage, SummaryStage, TopicStage, WriteStage};
pub use state::PipelineState;
pub use store::{parse_pages, McpNoteStore, NoteStore, NotionPage, ToolCaller};
