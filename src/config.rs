//! Client Configuration
//!
//! JSON settings; every field has a default so partial files are fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Log file base name
    pub app_name: String,
    /// Where log files go (None = in-memory log buffer only)
    pub log_dir: Option<PathBuf>,
    pub log_buffer_lines: usize,
    pub max_log_bytes: u64,
    pub max_log_files: usize,
    /// Pending UI intents before senders wait
    pub intent_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_name: "SharedTodo".to_string(),
            log_dir: None,
            log_buffer_lines: 500,
            max_log_bytes: 1024 * 1024,
            max_log_files: 3,
            intent_capacity: 64,
        }
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.is_empty() {
            return Err(ConfigError::Invalid("app_name must not be empty".into()));
        }
        if self.intent_capacity == 0 {
            return Err(ConfigError::Invalid("intent_capacity must be positive".into()));
        }
        Ok(())
    }

    pub fn logger_config(&self) -> rolling_logger::LoggerConfig {
        let mut config = rolling_logger::LoggerConfig::new(&self.app_name);
        config.log_dir = self.log_dir.clone();
        config.buffer_lines = self.log_buffer_lines;
        config.max_bytes = self.max_log_bytes;
        config.max_files = self.max_log_files;
        config
    }
}
