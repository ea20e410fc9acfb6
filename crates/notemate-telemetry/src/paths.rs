//! Path resolution for the notemate data directory

use std::path::PathBuf;

/// Environment variable overriding the data directory
pub const HOME_ENV: &str = "NOTEMATE_HOME";

/// Resolves standard paths under the data directory (`~/.notemate` by default)
#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
}

impl Paths {
    /// Resolve from `NOTEMATE_HOME`, falling back to `~/.notemate`
    pub fn new() -> std::io::Result<Self> {
        if let Some(custom) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(PathBuf::from(custom)));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;

        Ok(Self::at(home.join(".notemate")))
    }

    /// Root paths at an explicit directory
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// SQLite file backing the vector store
    pub fn index_db(&self) -> PathBuf {
        self.data_dir.join("index.db")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    /// Transcript of one chat session
    pub fn session_file(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(format!("{}.jsonl", session_id))
    }

    /// Append-only log of note pipeline runs
    pub fn runs_file(&self) -> PathBuf {
        self.data_dir.join("runs.jsonl")
    }

    /// REPL line history
    pub fn history_file(&self) -> PathBuf {
        self.data_dir.join("repl_history.txt")
    }

    /// Session ids with a transcript on disk, sorted
    pub fn list_sessions(&self) -> std::io::Result<Vec<String>> {
        let dir = self.sessions_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<String> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("jsonl"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_paths_default_dir() {
        let original = std::env::var_os(HOME_ENV);
        unsafe { std::env::remove_var(HOME_ENV) };

        let paths = Paths::new().unwrap();

        if let Some(v) = original {
            unsafe { std::env::set_var(HOME_ENV, v) };
        }
        assert!(paths.data_dir.ends_with(".notemate"));
    }

    #[test]
    #[serial]
    fn test_paths_env_override() {
        let temp = TempDir::new().unwrap();
        let original = std::env::var_os(HOME_ENV);
        unsafe { std::env::set_var(HOME_ENV, temp.path()) };

        let paths = Paths::new().unwrap();

        match original {
            Some(v) => unsafe { std::env::set_var(HOME_ENV, v) },
            None => unsafe { std::env::remove_var(HOME_ENV) },
        }
        assert_eq!(paths.data_dir, temp.path());
    }

    #[test]
    fn test_session_file() {
        let paths = Paths::at("/tmp/nm");
        assert_eq!(
            paths.session_file("s1"),
            PathBuf::from("/tmp/nm/sessions/s1.jsonl")
        );
        assert!(paths.runs_file().ends_with("runs.jsonl"));
        assert!(paths.index_db().ends_with("index.db"));
    }

    #[test]
    fn test_list_sessions() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::at(temp.path());
        assert!(paths.list_sessions().unwrap().is_empty());

        std::fs::create_dir_all(paths.sessions_dir()).unwrap();
        std::fs::write(paths.session_file("b"), "").unwrap();
        std::fs::write(paths.session_file("a"), "").unwrap();
        std::fs::write(paths.sessions_dir().join("notes.txt"), "").unwrap();

        assert_eq!(paths.list_sessions().unwrap(), vec!["a", "b"]);
    }
}
