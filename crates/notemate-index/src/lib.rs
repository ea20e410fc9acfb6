//! Document ingestion and chunk retrieval over a SQLite-backed vector store

mod bm25;
mod embed;
mod loader;
mod splitter;
mod store;

pub use embed::{cosine_similarity, Embedder, FastEmbedder};
pub use loader::{is_supported, load_directory, load_document, IndexError, SourceDocument};
pub use splitter::TextSplitter;
pub use store::{format_context, IndexStats, ScoredChunk, VectorStore};
