//! SQLite-backed chunk store with embedding similarity search

use crate::bm25::Bm25;
use crate::embed::{cosine_similarity, Embedder};
use crate::loader::SourceDocument;
use crate::splitter::TextSplitter;
use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// A retrieved chunk with its relevance score (higher is better)
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub source: String,
    pub chunk_index: usize,
    pub content: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub chunks: usize,
    pub sources: usize,
}

struct StoredChunk {
    source: String,
    chunk_index: usize,
    content: String,
    embedding: Vec<f32>,
}

fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

pub struct VectorStore {
    conn: Connection,
    embedder: Box<dyn Embedder>,
    splitter: TextSplitter,
}

impl VectorStore {
    pub fn open(db_path: &Path, embedder: Box<dyn Embedder>, splitter: TextSplitter) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn,
            embedder,
            splitter,
        })
    }

    /// Store backed by an in-memory database
    pub fn in_memory(embedder: Box<dyn Embedder>, splitter: TextSplitter) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn,
            embedder,
            splitter,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                path TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                added_at TEXT NOT NULL
            );
            ",
        )?;

        let has_path: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info('chunks') WHERE name = 'path'",
            [],
            |row| row.get(0),
        )?;
        if has_path == 0 {
            // Databases written before chunks carried a path: the name was the identity
            conn.execute_batch(
                "
                ALTER TABLE chunks ADD COLUMN path TEXT NOT NULL DEFAULT '';
                UPDATE chunks SET path = source;
                ",
            )?;
            tracing::info!("added path column to chunk index");
        }
        conn.execute_batch("CREATE INDEX IF NOT EXISTS idx_chunks_path ON chunks(path);")?;
        Ok(())
    }

    /// Split, embed and store documents; returns the number of chunks added.
    ///
    /// Re-adding a document with the same path replaces its previous chunks.
    pub fn add_documents(&mut self, documents: &[SourceDocument]) -> Result<usize> {
        let mut added = 0;

        for doc in documents {
            let chunks = self.splitter.split(&doc.text);
            if chunks.is_empty() {
                tracing::warn!(source = %doc.source, "document produced no chunks");
                continue;
            }

            let embeddings = self.embedder.embed(chunks.clone())?;
            if embeddings.len() != chunks.len() {
                anyhow::bail!(
                    "embedder returned {} vectors for {} chunks",
                    embeddings.len(),
                    chunks.len()
                );
            }

            let tx = self.conn.transaction()?;
            let replaced = tx.execute("DELETE FROM chunks WHERE path = ?1", params![doc.path])?;
            let now = Utc::now().to_rfc3339();
            for (i, (content, embedding)) in chunks.iter().zip(embeddings.iter()).enumerate() {
                tx.execute(
                    "INSERT INTO chunks (source, path, chunk_index, content, embedding, added_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![doc.source, doc.path, i as i64, content, encode_embedding(embedding), now],
                )?;
            }
            tx.commit()?;

            if replaced > 0 {
                tracing::info!(path = %doc.path, replaced, "replaced previous chunks");
            }
            tracing::info!(source = %doc.source, chunks = chunks.len(), "indexed document");
            added += chunks.len();
        }

        Ok(added)
    }

    fn load_chunks(&self) -> Result<Vec<StoredChunk>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, chunk_index, content, embedding FROM chunks ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let blob: Vec<u8> = row.get(3)?;
            Ok(StoredChunk {
                source: row.get(0)?,
                chunk_index: row.get::<_, i64>(1)? as usize,
                content: row.get(2)?,
                embedding: decode_embedding(&blob),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Best `k` chunks for `query` by cosine similarity.
    ///
    /// Falls back to BM25 over chunk text when the query cannot be embedded.
    pub fn similarity_search(&mut self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let chunks = self.load_chunks()?;
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = match self.embedder.embed(vec![query.to_string()]) {
            Ok(mut v) if !v.is_empty() => v.swap_remove(0),
            Ok(_) => return Ok(lexical_search(chunks, query, k)),
            Err(e) => {
                tracing::warn!(error = %e, "query embedding failed, using lexical ranking");
                return Ok(lexical_search(chunks, query, k));
            }
        };

        let mut scored: Vec<ScoredChunk> = chunks
            .into_iter()
            .map(|chunk| {
                let score = cosine_similarity(&query_embedding, &chunk.embedding);
                ScoredChunk {
                    source: chunk.source,
                    chunk_index: chunk.chunk_index,
                    content: chunk.content,
                    score,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let (chunks, sources): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT path) FROM chunks",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(IndexStats {
            chunks: chunks as usize,
            sources: sources as usize,
        })
    }

    /// Indexed files as (name, chunk count), by name then path
    pub fn sources(&self) -> Result<Vec<(String, usize)>> {
        let mut stmt = self.conn.prepare(
            "SELECT source, COUNT(*) FROM chunks GROUP BY path ORDER BY source, path",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn lexical_search(chunks: Vec<StoredChunk>, query: &str, k: usize) -> Vec<ScoredChunk> {
    let bm25 = Bm25::index(chunks.iter().map(|c| c.content.as_str()));
    bm25.search(query, k)
        .into_iter()
        .map(|(idx, score)| {
            let chunk = &chunks[idx];
            ScoredChunk {
                source: chunk.source.clone(),
                chunk_index: chunk.chunk_index,
                content: chunk.content.clone(),
                score: score as f32,
            }
        })
        .collect()
}

/// Chunk contents joined by blank lines, as fed to the chat prompt
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bag-of-letters embedder: deterministic and model-free
    struct LetterEmbedder;

    impl Embedder for LetterEmbedder {
        fn embed(&mut self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0f32; 26];
                    for c in t.to_lowercase().chars().filter(|c| c.is_ascii_lowercase()) {
                        v[(c as u8 - b'a') as usize] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    /// Embeds documents but fails for queries (single-text batches)
    struct FlakyEmbedder;

    impl Embedder for FlakyEmbedder {
        fn embed(&mut self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            if texts.len() == 1 && texts[0].starts_with("query:") {
                anyhow::bail!("model offline");
            }
            LetterEmbedder.embed(texts)
        }
    }

    fn doc(source: &str, text: &str) -> SourceDocument {
        SourceDocument::new(source, text)
    }

    fn file_doc(path: &str, text: &str) -> SourceDocument {
        SourceDocument {
            source: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_embedding_blob_roundtrip() {
        let v = vec![0.5f32, -1.25, 3.0];
        assert_eq!(decode_embedding(&encode_embedding(&v)), v);
    }

    #[test]
    fn test_empty_store() {
        let mut store = VectorStore::in_memory(Box::new(LetterEmbedder), TextSplitter::new(500, 50)).unwrap();
        assert!(store.similarity_search("anything", 5).unwrap().is_empty());
        assert_eq!(store.stats().unwrap(), IndexStats { chunks: 0, sources: 0 });
    }

    #[test]
    fn test_add_and_search() {
        let mut store = VectorStore::in_memory(Box::new(LetterEmbedder), TextSplitter::new(500, 50)).unwrap();
        let added = store
            .add_documents(&[
                doc("a.txt", "zzzz zzz zz"),
                doc("b.txt", "aaaa bbb"),
            ])
            .unwrap();
        assert_eq!(added, 2);

        let results = store.similarity_search("zz", 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "a.txt");
        assert!(results[0].score > 0.99);
    }

    #[test]
    fn test_readding_source_replaces_chunks() {
        let mut store = VectorStore::in_memory(Box::new(LetterEmbedder), TextSplitter::new(20, 0)).unwrap();
        store
            .add_documents(&[doc("book.pdf", "one two three four five six seven eight")])
            .unwrap();
        let first = store.stats().unwrap();
        assert!(first.chunks > 1);

        store.add_documents(&[doc("book.pdf", "short")]).unwrap();
        assert_eq!(store.stats().unwrap(), IndexStats { chunks: 1, sources: 1 });
        assert_eq!(store.sources().unwrap(), vec![("book.pdf".to_string(), 1)]);
    }

    #[test]
    fn test_same_name_different_paths_kept_apart() {
        let mut store = VectorStore::in_memory(Box::new(LetterEmbedder), TextSplitter::new(500, 50)).unwrap();
        let added = store
            .add_documents(&[
                file_doc("/docs/a/README.md", "install with cargo"),
                file_doc("/docs/b/README.md", "run the server"),
            ])
            .unwrap();

        assert_eq!(added, 2);
        assert_eq!(store.stats().unwrap(), IndexStats { chunks: 2, sources: 2 });
        assert_eq!(
            store.sources().unwrap(),
            vec![("README.md".to_string(), 1), ("README.md".to_string(), 1)]
        );

        // a separate run re-adding one of them only replaces that file
        store
            .add_documents(&[file_doc("/docs/b/README.md", "run the server again")])
            .unwrap();
        assert_eq!(store.stats().unwrap(), IndexStats { chunks: 2, sources: 2 });
    }

    #[test]
    fn test_upgrades_index_without_path_column() {
        let temp = tempfile::TempDir::new().unwrap();
        let db = temp.path().join("index.db");
        {
            let conn = Connection::open(&db).unwrap();
            conn.execute_batch(
                "
                CREATE TABLE chunks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    source TEXT NOT NULL,
                    chunk_index INTEGER NOT NULL,
                    content TEXT NOT NULL,
                    embedding BLOB NOT NULL,
                    added_at TEXT NOT NULL
                );
                INSERT INTO chunks (source, chunk_index, content, embedding, added_at)
                VALUES ('old.txt', 0, 'old text', x'0000803f', '2026-01-01T00:00:00Z');
                ",
            )
            .unwrap();
        }

        let mut store = VectorStore::open(&db, Box::new(LetterEmbedder), TextSplitter::new(500, 50)).unwrap();
        assert_eq!(store.stats().unwrap(), IndexStats { chunks: 1, sources: 1 });
        store.add_documents(&[doc("old.txt", "new text")]).unwrap();
        assert_eq!(store.stats().unwrap().chunks, 1);
    }

    #[test]
    fn test_lexical_fallback() {
        let mut store = VectorStore::in_memory(Box::new(FlakyEmbedder), TextSplitter::new(500, 50)).unwrap();
        store
            .add_documents(&[
                doc("diet.txt", "ginger tea soothes the stomach"),
                doc("meds.txt", "proton pump inhibitors reduce acid"),
            ])
            .unwrap();

        let results = store.similarity_search("query: ginger", 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "diet.txt");
    }

    #[test]
    fn test_format_context() {
        let chunks = vec![
            ScoredChunk {
                source: "a".to_string(),
                chunk_index: 0,
                content: "first".to_string(),
                score: 0.9,
            },
            ScoredChunk {
                source: "b".to_string(),
                chunk_index: 0,
                content: "second".to_string(),
                score: 0.8,
            },
        ];
        assert_eq!(format_context(&chunks), "first\n\nsecond");
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn test_persists_across_open() {
        let temp = tempfile::TempDir::new().unwrap();
        let db = temp.path().join("index.db");
        {
            let mut store = VectorStore::open(&db, Box::new(LetterEmbedder), TextSplitter::new(500, 50)).unwrap();
            store.add_documents(&[doc("a.md", "hello world")]).unwrap();
        }
        let store = VectorStore::open(&db, Box::new(LetterEmbedder), TextSplitter::new(500, 50)).unwrap();
        assert_eq!(store.stats().unwrap().chunks, 1);
    }
}
