//! Triage Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction oracle (LLM) configuration
    pub llm: LlmConfig,

    /// Lookup service configuration
    pub lookup: LookupConfig,

    /// Lookup cache configuration
    pub cache: CacheConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // LLM
        if let Ok(key) = std::env::var("TRIAGE_OPENAI_API_KEY") {
            config.llm.api_key = Some(key);
        } else if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("TRIAGE_LLM_BASE_URL") {
            config.llm.base_url = Some(url);
        }
        if let Ok(model) = std::env::var("TRIAGE_LLM_MODEL") {
            config.llm.model = model;
        }

        // Lookup workbooks
        if let Ok(path) = std::env::var("TRIAGE_ASSETS_WORKBOOK") {
            config.lookup.assets_workbook = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("TRIAGE_CONTACTS_WORKBOOK") {
            config.lookup.contacts_workbook = PathBuf::from(path);
        }

        // Cache
        if let Ok(enabled) = std::env::var("TRIAGE_CACHE_ENABLED") {
            config.cache.enabled = enabled.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TRIAGE_CACHE_ENABLED".to_string(),
                value: enabled,
            })?;
        }
        if let Ok(ttl) = std::env::var("TRIAGE_CACHE_TTL_SECONDS") {
            config.cache.ttl_seconds = ttl.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TRIAGE_CACHE_TTL_SECONDS".to_string(),
                value: ttl,
            })?;
        }

        // Logging
        if let Ok(level) = std::env::var("TRIAGE_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        // Always use env for sensitive values
        if env_config.llm.api_key.is_some() {
            self.llm.api_key = env_config.llm.api_key;
        }
        if env_config.llm.base_url.is_some() {
            self.llm.base_url = env_config.llm.base_url;
        }

        // Only override if env values differ from defaults
        let defaults = Self::default();
        if env_config.llm.model != defaults.llm.model {
            self.llm.model = env_config.llm.model;
        }
        if env_config.lookup.assets_workbook != defaults.lookup.assets_workbook {
            self.lookup.assets_workbook = env_config.lookup.assets_workbook;
        }
        if env_config.lookup.contacts_workbook != defaults.lookup.contacts_workbook {
            self.lookup.contacts_workbook = env_config.lookup.contacts_workbook;
        }
        if env_config.cache.enabled != defaults.cache.enabled {
            self.cache.enabled = env_config.cache.enabled;
        }
        if env_config.cache.ttl_seconds != defaults.cache.ttl_seconds {
            self.cache.ttl_seconds = env_config.cache.ttl_seconds;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }

        Ok(self)
    }
}

/// Extraction oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key; when absent the CLI falls back to the rule-based extractor
    pub api_key: Option<String>,

    /// API base URL (for Azure or compatible APIs)
    pub base_url: Option<String>,

    /// Model name to use
    pub model: String,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.1,
            timeout_secs: 60,
        }
    }
}

/// Lookup service (spreadsheet) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Workbook holding the hostname -> support group table
    pub assets_workbook: PathBuf,

    /// Sheet name within the assets workbook
    pub assets_sheet: String,

    /// Workbook holding the support group -> contacts table
    pub contacts_workbook: PathBuf,

    /// Sheet name within the contacts workbook
    pub contacts_sheet: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            assets_workbook: PathBuf::from("assets.xlsx"),
            assets_sheet: "Sheet1".to_string(),
            contacts_workbook: PathBuf::from("contacts.xlsx"),
            contacts_sheet: "Sheet1".to_string(),
        }
    }
}

/// Lookup cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Master on/off switch
    pub enabled: bool,

    /// Time-to-live for cache entries (in seconds)
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // Lookup tables change rarely, cache for 1 hour
            ttl_seconds: 3600,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_seconds, 3600);
        assert_eq!(config.lookup.assets_sheet, "Sheet1");
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [llm]
            model = "gpt-4o"

            [cache]
            enabled = false
            ttl_seconds = 120
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_seconds, 120);
    }
}
