//! Configuration
//!
//! The config file is a single JSON object:
//!
//! ```json
//! {
//!   "data_dir": "./data",
//!   "log_filter": "info",
//!   "engine": { "memoize_lookups": false, "max_documents": null }
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::Severity;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "DOCAGG_CONFIG_READ",
            ConfigError::Parse(_) => "DOCAGG_CONFIG_PARSE",
            ConfigError::Invalid(_) => "DOCAGG_CONFIG_INVALID",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

/// Execution settings for the pipeline engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Reuse lookup results for repeated local values within one execution
    #[serde(default)]
    pub memoize_lookups: bool,

    /// Upper bound on the number of documents any stage may produce
    #[serde(default)]
    pub max_documents: Option<usize>,
}

impl EngineConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_documents == Some(0) {
            return Err(ConfigError::Invalid("engine.max_documents must be > 0".into()));
        }
        Ok(())
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding one `<collection>.json` file per collection
    pub data_dir: PathBuf,

    /// Default tracing filter, overridden by `DOCAGG_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid("log_filter must not be empty".into()));
        }
        self.engine.validate()
    }

    /// Resolves `data_dir` against the directory containing the config file
    pub fn data_path(&self, config_path: &Path) -> PathBuf {
        if self.data_dir.is_absolute() {
            return self.data_dir.clone();
        }
        config_path
            .parent()
            .map(|dir| dir.join(&self.data_dir))
            .unwrap_or_else(|| self.data_dir.clone())
    }
}
