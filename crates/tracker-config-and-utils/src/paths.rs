//! File system paths for the tracker.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name created under the user's home directory.
const BASE_DIR_NAME: &str = ".distance-tracker";
/// Key-value store filename under the base directory.
const STORE_FILE_NAME: &str = "store.json";

/// Manages file system paths for the tracker.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.distance-tracker)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.distance-tracker`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.distance-tracker).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.distance-tracker/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the durable key-value store path (~/.distance-tracker/store.json).
    pub fn store_file(&self) -> PathBuf {
        self.base_dir.join(STORE_FILE_NAME)
    }

    /// Get the logs directory (~/.distance-tracker/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the JSONL log file path (~/.distance-tracker/logs/dev.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("dev.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
