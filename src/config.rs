//! Configuration types and loading

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("API key not found. Set the {env} environment variable.")]
    MissingApiKey { env: String },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider transport configuration
    pub llm: LlmConfig,

    /// Result caps for the read-only tools
    pub tools: ToolCaps,

    /// Workspace root configuration
    pub workspace: WorkspaceConfig,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Explicit path if given, then project-local `.codescout.yml`, then
    /// built-in defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(".codescout.yml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    warn!(path = %local.display(), error = %e, "failed to load local config, using defaults");
                }
            }
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Validate configuration before use
    ///
    /// Fails fast with a clear message when the API key environment variable
    /// is unset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.llm.api_key()?;
        Ok(())
    }
}

/// Provider transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum output tokens per turn
    pub max_output_tokens: u32,

    /// Maximum transparent reconnect attempts for transient failures
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_ms: 300_000,
            max_output_tokens: 8192,
            max_retries: 3,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env).map_err(|_| ConfigError::MissingApiKey {
            env: self.api_key_env.clone(),
        })
    }
}

/// Result caps for the read-only tools
///
/// Every cap pairs with a `truncated` flag on the result metadata when hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCaps {
    /// Maximum matching lines returned by content search
    pub max_matches: usize,

    /// Maximum lines returned by a file read
    pub max_read_lines: usize,

    /// Per-line length cap for file reads
    pub max_line_length: usize,

    /// Maximum recursion depth for directory listing
    pub max_list_depth: usize,

    /// Maximum entries returned by directory listing
    pub max_list_entries: usize,

    /// Maximum paths returned by glob matching
    pub max_glob_matches: usize,
}

impl Default for ToolCaps {
    fn default() -> Self {
        Self {
            max_matches: 50,
            max_read_lines: 2000,
            max_line_length: 2000,
            max_list_depth: 3,
            max_list_entries: 500,
            max_glob_matches: 1000,
        }
    }
}

/// Workspace root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root directory the session is allowed to read
    pub root: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}
