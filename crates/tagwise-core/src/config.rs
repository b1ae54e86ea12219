//! Configuration for tag curation and upstream access

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tagwise_telemetry::redact_api_key;
use thiserror::Error;

/// Environment variable overriding `provider.api_key`
pub const API_KEY_ENV: &str = "TAGWISE_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tag selection weights and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    /// Max tags presented to the model
    pub max_tags: usize,

    /// Max estimated tokens spent on the tag section
    pub token_budget: usize,

    /// Weight of raw usage count in the tag score
    pub frequency_weight: f64,

    /// Weight of text similarity in the tag score
    pub similarity_weight: f64,

    /// Multiplier bringing similarity (0..1) onto the scale of usage counts
    pub similarity_scale: f64,
}

impl CurationConfig {
    pub fn new() -> Self {
        Self {
            max_tags: 50,
            token_budget: 500,
            frequency_weight: 0.7,
            similarity_weight: 0.3,
            similarity_scale: 100.0,
        }
    }
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Upstream provider selection and call limits
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Registry name of the provider
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key: String,

    /// Per-call timeout
    pub timeout_secs: u64,

    /// Log complete prompts and responses instead of previews
    pub full_logging: bool,

    /// Attempts the CLI retry loop makes before giving up
    pub max_attempts: u32,
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
            full_logging: false,
            max_attempts: 3,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &redact_api_key(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .field("full_logging", &self.full_logging)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Process configuration (config.json)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub curation: CurationConfig,
    pub provider: ProviderConfig,

    /// JSONL file receiving one record per upstream attempt
    pub call_log: Option<PathBuf>,
}

impl AppConfig {
    /// Load from `path`; a missing file yields defaults. The API key env var wins
    /// over the file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.provider.api_key = key;
            }
        }

        Ok(config)
    }

    /// Load from the standard location under the tagwise home directory
    pub fn load_default() -> anyhow::Result<Self> {
        let paths = tagwise_telemetry::Paths::new()?;
        Ok(Self::load(&paths.config_file())?)
    }
}
