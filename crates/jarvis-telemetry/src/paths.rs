//! Path resolution for engine state files

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory
pub const HOME_ENV: &str = "JARVIS_HOME";

/// Resolves standard paths for the engine's stores
#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
}

impl Paths {
    /// Resolve the data directory from `$JARVIS_HOME`, falling back to `~/.jarvis`
    pub fn new() -> std::io::Result<Self> {
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(PathBuf::from(dir)));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;

        Ok(Self::at(home.join(".jarvis")))
    }

    /// Use an explicit data directory
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Append-only interaction log
    pub fn events_file(&self) -> PathBuf {
        self.data_dir.join("events.jsonl")
    }

    /// Preference score snapshot
    pub fn preferences_file(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }

    /// Content pool snapshot
    pub fn pool_file(&self) -> PathBuf {
        self.data_dir.join("pool.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// Drop directory scanned by the file-based content sources
    pub fn drop_dir(&self) -> PathBuf {
        self.data_dir.join("incoming")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_paths_from_env() {
        let temp = tempfile::TempDir::new().unwrap();
        std::env::set_var(HOME_ENV, temp.path());
        let paths = Paths::new().unwrap();
        std::env::remove_var(HOME_ENV);

        assert_eq!(paths.data_dir(), temp.path());
    }

    #[test]
    #[serial]
    fn test_paths_default_home() {
        std::env::remove_var(HOME_ENV);
        let paths = Paths::new().unwrap();
        assert!(paths.data_dir.ends_with(".jarvis"));
    }

    #[test]
    fn test_store_files() {
        let paths = Paths::at("/tmp/jarvis-test");
        assert!(paths.events_file().ends_with("events.jsonl"));
        assert!(paths.preferences_file().ends_with("preferences.json"));
        assert!(paths.pool_file().ends_with("pool.json"));
        assert!(paths.config_file().ends_with("config.json"));
        assert!(paths.drop_dir().ends_with("incoming"));
    }
}
