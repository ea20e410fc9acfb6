//! Turning files on disk into plain text

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to extract text from PDF {path}: {message}")]
    Pdf { path: PathBuf, message: String },
    #[error("{0} contains no extractable text")]
    Empty(PathBuf),
}

/// Extracted text of one file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// File name shown to the user and stored with each chunk
    pub source: String,
    /// Identity of the file in the store; re-adding the same path replaces it
    pub path: String,
    pub text: String,
}

impl SourceDocument {
    /// Document not backed by a file; its name doubles as its identity
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            path: source.clone(),
            source,
            text: text.into(),
        }
    }
}

const SUPPORTED: &[&str] = &["pdf", "txt", "md", "markdown"];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SUPPORTED.contains(&ext.as_str()))
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn source_path(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Collapse trailing whitespace and runs of blank lines left by PDF extraction
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

/// Load a PDF, text or markdown file
pub fn load_document(path: &Path) -> Result<SourceDocument, IndexError> {
    let raw = match extension(path).as_deref() {
        Some("pdf") => pdf_extract::extract_text(path).map_err(|e| IndexError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?,
        Some("txt") | Some("md") | Some("markdown") => {
            std::fs::read_to_string(path).map_err(|source| IndexError::Io {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => return Err(IndexError::UnsupportedFormat(path.to_path_buf())),
    };

    let text = normalize(&raw);
    if text.is_empty() {
        return Err(IndexError::Empty(path.to_path_buf()));
    }

    Ok(SourceDocument {
        source: source_name(path),
        path: source_path(path),
        text,
    })
}

/// Load every supported file under `dir`, in path order.
///
/// Files that fail to load are logged and skipped.
pub fn load_directory(dir: &Path) -> Vec<SourceDocument> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_supported(path))
        .collect();
    paths.sort();

    paths
        .iter()
        .filter_map(|path| match load_document(path) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping document");
                None
            }
        })
        .collect()
}
