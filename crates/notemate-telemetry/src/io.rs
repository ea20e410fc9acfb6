//! JSONL transcripts and atomic file writes

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Append one record as a JSON line, creating parent directories as needed
pub fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let line = serde_json::to_string(record)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Read every well-formed record from a JSONL file.
///
/// A missing file reads as empty. Lines that fail to parse are skipped so a
/// transcript cut off mid-write still loads.
pub fn read_jsonl<T: for<'de> Deserialize<'de>>(path: &Path) -> std::io::Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Ok(record) = serde_json::from_str(trimmed) {
            records.push(record);
        }
    }

    Ok(records)
}

/// Write data via a sibling temp file and rename
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, data)?;
    std::fs::rename(temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Line {
        role: String,
        content: String,
    }

    fn line(role: &str, content: &str) -> Line {
        Line {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_append_creates_nested_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions").join("abc.jsonl");

        append_jsonl(&path, &line("user", "hello")).unwrap();
        append_jsonl(&path, &line("assistant", "hi there")).unwrap();

        let read: Vec<Line> = read_jsonl(&path).unwrap();
        assert_eq!(read, vec![line("user", "hello"), line("assistant", "hi there")]);
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let read: Vec<Line> = read_jsonl(&temp.path().join("nope.jsonl")).unwrap();
        assert!(read.is_empty());
    }

    #[test]
    fn test_read_skips_truncated_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("partial.jsonl");
        std::fs::write(
            &path,
            "{\"role\":\"user\",\"content\":\"ok\"}\n\n{\"role\":\"assis",
        )
        .unwrap();

        let read: Vec<Line> = read_jsonl(&path).unwrap();
        assert_eq!(read, vec![line("user", "ok")]);
    }

    #[test]
    fn test_atomic_write_replaces_contents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");

        atomic_write(&path, b"{\"top_k\": 3}").unwrap();
        atomic_write(&path, b"{\"top_k\": 5}").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"top_k\": 5}");
        assert!(!path.with_extension("tmp").exists());
    }
}
