use notemate_llm::LlmError;
use notemate_mcp::McpError;

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("chat history is empty, nothing to summarize")]
    EmptyHistory,
    #[error("stage '{stage}' requires '{key}' in pipeline state")]
    MissingInput { stage: String, key: String },
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Mcp(#[from] McpError),
    #[error("{0} tool not found in MCP")]
    ToolNotFound(String),
    #[error("No pages found in Notion workspace")]
    NoPages,
    #[error("No Notion blocks available for writing")]
    NoBlocks,
    #[error("image search failed: {0}")]
    ImageSearch(String),
    #[error("model returned an empty {0}")]
    EmptyOutput(&'static str),
}
