//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Deployment origin, e.g. "https://predict.example.co.ke"
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Number of markets requested per listing
    #[serde(default = "default_markets_page_size")]
    pub markets_page_size: u32,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_markets_page_size() -> u32 {
    6
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            markets_page_size: default_markets_page_size(),
        }
    }
}

/// Local persistent storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("predict").to_string_lossy().to_string())
        .unwrap_or_else(|| "./predict_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Session validation behavior
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Keep the persisted token when the profile check fails for a
    /// transient reason (connect error, timeout, 5xx). Rejections by the
    /// server always clear it.
    #[serde(default = "default_keep_session")]
    pub keep_session_on_transient_error: bool,
}

fn default_keep_session() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keep_session_on_transient_error: default_keep_session(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("predict").join("config.toml")),
            Some(PathBuf::from("/etc/predict/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("PREDICT_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(timeout) = std::env::var("PREDICT_REQUEST_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.api.request_timeout_secs = secs;
            }
        }

        if let Ok(data_dir) = std::env::var("PREDICT_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        if let Ok(level) = std::env::var("PREDICT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PREDICT_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# KenyaPolitics Predict client configuration
#
# Environment variables override these settings:
# - PREDICT_API_URL
# - PREDICT_REQUEST_TIMEOUT
# - PREDICT_DATA_DIR
# - PREDICT_LOG_LEVEL
# - PREDICT_LOG_FORMAT

[api]
# Deployment origin of the backend
base_url = "http://localhost:3000"

# Request timeout in seconds
request_timeout_secs = 30

# Markets requested per listing
markets_page_size = 6

[storage]
# Directory holding the persisted session token
data_dir = "~/.local/share/predict"

[session]
# Keep the saved token when the server is unreachable during the
# profile check (it is always cleared when the server rejects it)
keep_session_on_transient_error = true

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.api.markets_page_size, 6);
        assert!(config.session.keep_session_on_transient_error);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.storage.data_dir, "~/.local/share/predict");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse(
            r#"
            [api]
            base_url = "https://predict.example"

            [session]
            keep_session_on_transient_error = false
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://predict.example");
        assert_eq!(config.api.markets_page_size, 6);
        assert!(!config.session.keep_session_on_transient_error);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/predict.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
