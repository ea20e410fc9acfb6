use notemate_core::Config;
use notemate_index::{FastEmbedder, IndexStats, TextSplitter, VectorStore};
use notemate_telemetry::{read_jsonl, NoteRunRecord, Paths};
use serde_json::{json, Value};

fn index_stats(paths: &Paths, config: &Config) -> anyhow::Result<IndexStats> {
    let db = paths.index_db();
    if !db.exists() {
        return Ok(IndexStats {
            chunks: 0,
            sources: 0,
        });
    }
    let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap);
    VectorStore::open(&db, Box::new(FastEmbedder::new()), splitter)?.stats()
}

pub fn collect(paths: &Paths, config: &Config) -> anyhow::Result<Value> {
    let stats = index_stats(paths, config)?;
    let sessions = paths.list_sessions()?;
    let runs: Vec<NoteRunRecord> = read_jsonl(&paths.runs_file())?;
    let written = runs.iter().filter(|r| r.write_success).count();

    Ok(json!({
        "data_dir": paths.data_dir.display().to_string(),
        "indexed_chunks": stats.chunks,
        "sources": stats.sources,
        "sessions": sessions.len(),
        "note_runs": runs.len(),
        "notes_written": written,
        "config_file": paths.config_file().exists(),
        "chat_model": config.chat_model,
        "note_model": config.note_model,
        "llm_api_key": config.llm_api_key.is_some(),
        "notion_token": config.notion_token.is_some(),
        "serper_api_key": config.serper_api_key.is_some(),
    }))
}

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = Config::load(&paths);
    let output = collect(&paths, &config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
