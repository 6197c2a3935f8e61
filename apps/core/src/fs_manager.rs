use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the application home directory.
pub const HOME_ENV: &str = "IASC_HOME";

const DATASET_FILENAME: &str = "data.json";
const TRANSCRIPT_FILENAME: &str = "chat_logs.jsonl";

/// On-disk layout rooted at the application home.
///
/// ```text
/// <home>/data/data.json              intent dataset
/// <home>/data/logs/chat_logs.jsonl   transcript
/// <home>/data/exports/               JSON/CSV exports
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortablePathManager {
    root: PathBuf,
}

impl PortablePathManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the home directory: `IASC_HOME` if set, otherwise the crate
    /// directory in debug builds and the executable's directory in release.
    pub fn discover() -> Self {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Self::new(home);
        }
        Self::new(Self::default_root())
    }

    fn default_root() -> PathBuf {
        #[cfg(debug_assertions)]
        {
            // Running from the workspace: the data lives next to this crate.
            let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            if manifest.exists() {
                return manifest;
            }
        }

        match std::env::current_exe() {
            Ok(mut path) => {
                path.pop();
                path
            }
            Err(e) => {
                warn!("Failed to get current exe path: {}. Falling back to current_dir.", e);
                std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
            }
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// `<home>/data`
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// `<home>/data/logs`
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    /// `<home>/data/exports`
    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir().join("exports")
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir().join(DATASET_FILENAME)
    }

    pub fn transcript_path(&self) -> PathBuf {
        self.logs_dir().join(TRANSCRIPT_FILENAME)
    }

    /// Create the data and logs directories if missing.
    pub fn init(&self) -> Result<(), std::io::Error> {
        for dir in [self.data_dir(), self.logs_dir()] {
            if !dir.exists() {
                info!("Creating directory: {:?}", dir);
                fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let paths = PortablePathManager::new("/srv/iasc");
        assert_eq!(paths.dataset_path(), PathBuf::from("/srv/iasc/data/data.json"));
        assert_eq!(
            paths.transcript_path(),
            PathBuf::from("/srv/iasc/data/logs/chat_logs.jsonl")
        );
        assert_eq!(paths.exports_dir(), PathBuf::from("/srv/iasc/data/exports"));
    }

    #[test]
    fn test_home_env_override() {
        temp_env::with_var(HOME_ENV, Some("/tmp/iasc-home"), || {
            let paths = PortablePathManager::discover();
            assert_eq!(paths.root_dir(), Path::new("/tmp/iasc-home"));
        });
    }

    #[test]
    fn test_init_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PortablePathManager::new(temp_dir.path());
        paths.init().unwrap();
        assert!(paths.data_dir().is_dir());
        assert!(paths.logs_dir().is_dir());
        // Idempotent
        paths.init().unwrap();
    }
}
