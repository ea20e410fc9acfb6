pub mod chat;
pub mod ingest;
pub mod init;
pub mod note;
pub mod pages;
pub mod status;
pub mod version;

use notemate_core::Config;
use notemate_index::{FastEmbedder, TextSplitter, VectorStore};
use notemate_llm::{ChatModel, OpenAiCompatClient};
use notemate_notes::{ImageSearch, McpNoteStore, SerperImageSearch};
use notemate_telemetry::Paths;
use std::sync::Arc;

pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

pub fn open_index(paths: &Paths, config: &Config) -> anyhow::Result<VectorStore> {
    let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap);
    VectorStore::open(&paths.index_db(), Box::new(FastEmbedder::new()), splitter)
}

pub fn chat_model(config: &Config) -> anyhow::Result<Arc<dyn ChatModel>> {
    let client = OpenAiCompatClient::new(&config.llm_base_url, config.require_api_key()?)?;
    Ok(Arc::new(client))
}

/// Image lookup, disabled when no Serper key is configured
pub fn image_search(config: &Config) -> Option<Arc<dyn ImageSearch>> {
    let key = config.serper_api_key.as_deref()?;
    match SerperImageSearch::new(&config.image_search_url, key) {
        Ok(search) => Some(Arc::new(search)),
        Err(e) => {
            tracing::warn!(error = %e, "image search unavailable");
            None
        }
    }
}

pub async fn connect_notion(config: &Config) -> anyhow::Result<McpNoteStore> {
    let server = config.mcp_server()?;
    Ok(McpNoteStore::connect(server).await?)
}
