use notemate_core::Config;
use notemate_telemetry::Paths;
use std::path::Path;

/// Write the default config unless one exists; returns true when written
pub fn write_default_config(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let json = serde_json::to_string_pretty(&Config::new())?;
    notemate_telemetry::atomic_write(path, json.as_bytes())?;
    Ok(true)
}

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config_path = paths.config_file();

    if write_default_config(&config_path)? {
        println!("✓ Wrote default config to {}", config_path.display());
    } else {
        println!("Config already exists at {}", config_path.display());
    }
    std::fs::create_dir_all(paths.sessions_dir())?;

    println!("\nSecrets are read from the environment (or a .env file):");
    println!("  GROQ_API_KEY    chat and note models");
    println!("  NOTION_TOKEN    Notion integration token");
    println!("  SERPER_API_KEY  reference image search (optional)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_default_config_once() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");

        assert!(write_default_config(&path).unwrap());
        let written: Config = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.top_k, 5);
        assert!(written.notion_token.is_none());

        std::fs::write(&path, "{\"top_k\": 9}").unwrap();
        assert!(!write_default_config(&path).unwrap());
        assert!(std::fs::read_to_string(&path).unwrap().contains("9"));
    }
}
