//! Configuration loading and management.
//!
//! Configuration is loaded with the following precedence:
//! 1. Environment variables (`PARLEY_*`, plus `GEMINI_API_KEY`)
//! 2. Config file (`~/.parley/config.toml`)
//! 3. Defaults

use crate::core::state::DEFAULT_TITLE_MAX_CHARS;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,

    /// Completion service configuration.
    pub completion: CompletionConfig,

    /// Chat behavior.
    pub chat: ChatConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the parley home directory (holds the profile).
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_parley_home(),
        }
    }
}

/// Completion service configuration.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Service credential. Never hard-coded; supply it here or via env.
    pub api_key: Option<String>,

    /// Model name.
    pub model: String,

    /// API base URL.
    pub base_url: String,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Chat behavior configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Characters kept when deriving a title from the first message.
    pub title_max_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            title_max_chars: DEFAULT_TITLE_MAX_CHARS,
        }
    }
}

/// Get the default parley home directory.
fn default_parley_home() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".parley"), |h| h.join(".parley"))
}

/// Load configuration with precedence: env vars → file → defaults.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    // Try to load config file
    let config_path = get_config_path();
    if config_path.exists() {
        let contents = fs::read_to_string(&config_path).map_err(Error::Storage)?;
        config = toml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))?;
    }

    // Override with environment variables
    apply_env_overrides(&mut config, |key| env::var(key).ok());

    if config.chat.title_max_chars == 0 {
        return Err(Error::Config("chat.title_max_chars must be positive".to_string()));
    }

    Ok(config)
}

/// Get the path to the config file.
fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("PARLEY_CONFIG") {
        return PathBuf::from(path);
    }

    if let Ok(home) = env::var("PARLEY_HOME") {
        return PathBuf::from(home).join("config.toml");
    }

    default_parley_home().join("config.toml")
}

/// Apply environment variable overrides to config.
fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    // Storage path
    if let Some(path) = var("PARLEY_STORAGE_PATH") {
        config.storage.path = PathBuf::from(path);
    } else if let Some(home) = var("PARLEY_HOME") {
        config.storage.path = PathBuf::from(home);
    }

    // Credential: parley-specific key wins over the service's conventional one
    if let Some(key) = var("PARLEY_API_KEY").or_else(|| var("GEMINI_API_KEY")) {
        config.completion.api_key = Some(key);
    }

    if let Some(model) = var("PARLEY_MODEL") {
        config.completion.model = model;
    }

    if let Some(url) = var("PARLEY_BASE_URL") {
        config.completion.base_url = url;
    }

    if let Some(val) = var("PARLEY_REQUEST_TIMEOUT_SECS") {
        if let Ok(secs) = val.parse() {
            config.completion.request_timeout_secs = secs;
        }
    }

    if let Some(val) = var("PARLEY_CONNECT_TIMEOUT_SECS") {
        if let Ok(secs) = val.parse() {
            config.completion.connect_timeout_secs = secs;
        }
    }

    if let Some(val) = var("PARLEY_TITLE_MAX_CHARS") {
        if let Ok(max) = val.parse() {
            config.chat.title_max_chars = max;
        }
    }
}
