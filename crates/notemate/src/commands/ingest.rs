use notemate_core::Config;
use notemate_index::{load_directory, load_document, SourceDocument, VectorStore};
use notemate_telemetry::Paths;
use std::path::Path;

/// Per-source chunk counts of one ingest
pub struct IngestReport {
    pub sources: Vec<(String, usize)>,
}

impl IngestReport {
    pub fn total_chunks(&self) -> usize {
        self.sources.iter().map(|(_, n)| n).sum()
    }
}

fn load(path: &Path) -> anyhow::Result<Vec<SourceDocument>> {
    if path.is_dir() {
        let docs = load_directory(path);
        if docs.is_empty() {
            anyhow::bail!("no supported documents under {}", path.display());
        }
        Ok(docs)
    } else {
        Ok(vec![load_document(path)?])
    }
}

/// Load a file or directory and add it to the store
pub fn ingest_path(index: &mut VectorStore, path: &Path) -> anyhow::Result<IngestReport> {
    let docs = load(path)?;
    let mut sources = Vec::with_capacity(docs.len());
    for doc in &docs {
        let added = index.add_documents(std::slice::from_ref(doc))?;
        sources.push((doc.source.clone(), added));
    }
    Ok(IngestReport { sources })
}

/// Transcript notice shown after a document is added
pub fn added_notice(source: &str) -> String {
    let kind = if source.to_ascii_lowercase().ends_with(".pdf") {
        "PDF"
    } else {
        "Document"
    };
    format!(
        "{} '{}' has been added to the knowledge base. You can now ask questions about it.",
        kind, source
    )
}

pub fn run(path: &Path) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = Config::load(&paths);
    let mut index = super::open_index(&paths, &config)?;

    let report = ingest_path(&mut index, path)?;
    for (source, chunks) in &report.sources {
        println!("  {}: {} chunks", source, chunks);
    }
    println!(
        "Added {} chunks from {} documents to the knowledge base",
        report.total_chunks(),
        report.sources.len()
    );

    let stats = index.stats()?;
    println!("Index: {} chunks from {} sources", stats.chunks, stats.sources);
    Ok(())
}
