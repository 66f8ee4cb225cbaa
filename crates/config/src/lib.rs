//! Configuration for finsight
//!
//! Settings live in a JSON file under ~/.finsight; secrets may also come
//! from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir};

/// Errors in configuration handling
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Conversational-agent back end access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: String::new(),
            model: default_model(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

/// Capability server location
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CapabilityConfig {
    #[serde(default)]
    pub base_url: String,
}

/// Document-analysis service access
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DocIntelConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
}

/// Run polling and sampling defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDefaults {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_polls() -> u32 {
    240
}

fn default_temperature() -> f32 {
    0.5
}

fn default_top_p() -> f32 {
    0.9
}

/// Root settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub capability: CapabilityConfig,
    #[serde(default)]
    pub docintel: DocIntelConfig,
    #[serde(default)]
    pub run: RunDefaults,
    #[serde(default)]
    pub user_prefix: String,
}

impl Config {
    /// Load settings from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("◆ no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("◆ reading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save settings to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to a specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("◆ writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Back-end API key, falling back to FINSIGHT_API_KEY
    pub fn api_key(&self) -> Option<String> {
        if !self.backend.api_key.is_empty() {
            return Some(self.backend.api_key.clone());
        }
        std::env::var("FINSIGHT_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
    }

    /// Verify back-end access is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// Back-end base URL
    pub fn api_base(&self) -> String {
        self.backend.api_base.clone()
    }

    /// Model used for newly created agents
    pub fn model(&self) -> String {
        self.backend.model.clone()
    }

    /// Capability server base URL, falling back to FINSIGHT_CAPABILITY_URL
    pub fn capability_url(&self) -> String {
        if !self.capability.base_url.is_empty() {
            return self.capability.base_url.clone();
        }
        std::env::var("FINSIGHT_CAPABILITY_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "http://localhost:8080".to_string())
    }

    /// Document-analysis endpoint, falling back to DOCINTEL_ENDPOINT
    pub fn docintel_endpoint(&self) -> Option<String> {
        if !self.docintel.endpoint.is_empty() {
            return Some(self.docintel.endpoint.clone());
        }
        std::env::var("DOCINTEL_ENDPOINT")
            .ok()
            .filter(|e| !e.is_empty())
    }

    /// Document-analysis API key, falling back to DOCINTEL_API_KEY
    pub fn docintel_api_key(&self) -> Option<String> {
        if !self.docintel.api_key.is_empty() {
            return Some(self.docintel.api_key.clone());
        }
        std::env::var("DOCINTEL_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
    }

    /// Agent-name prefix, falling back to USER_PREFIX then "DefaultUser"
    pub fn user_prefix(&self) -> String {
        if !self.user_prefix.is_empty() {
            return self.user_prefix.clone();
        }
        std::env::var("USER_PREFIX")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "DefaultUser".to_string())
    }

    /// Delay between run status polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.run.poll_interval_ms)
    }
}

/// Initialize the data directory and write a default config if absent
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("◆ config already exists at {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("◆ default config written to {:?}", config_path);
    }

    Config::load().await
}
