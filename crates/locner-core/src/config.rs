//! locner Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Gazetteer and type vocabulary sources
    pub lexicon: LexiconConfig,

    /// Sequence labeler configuration
    pub model: ModelConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            self.server.port = parse_var("API_PORT", port)?;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.server.cors_origins = split_list(&origins);
        }

        // Lexicons
        if let Ok(path) = std::env::var("GAZETTEER_PATH") {
            self.lexicon.gazetteer_path = path.into();
        }
        if let Ok(path) = std::env::var("TYPE_VOCAB_PATH") {
            self.lexicon.types_path = path.into();
        }
        if let Ok(flag) = std::env::var("MATCH_CASE_INSENSITIVE") {
            self.lexicon.case_insensitive = parse_bool("MATCH_CASE_INSENSITIVE", flag)?;
        }
        if let Ok(flag) = std::env::var("MATCH_WHOLE_WORD") {
            self.lexicon.whole_word = parse_bool("MATCH_WHOLE_WORD", flag)?;
        }

        // Model
        if let Ok(url) = std::env::var("MODEL_ENDPOINT") {
            self.model.endpoint = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Ok(key) = std::env::var("MODEL_API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Ok(secs) = std::env::var("MODEL_TIMEOUT_SECS") {
            self.model.timeout_secs = parse_var("MODEL_TIMEOUT_SECS", secs)?;
        }
        if let Ok(labels) = std::env::var("MODEL_LABELS") {
            self.model.labels = split_list(&labels);
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(flag) = std::env::var("LOG_JSON") {
            self.logging.json_format = parse_bool("LOG_JSON", flag)?;
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

fn parse_bool(key: &str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Allowed origins for CORS (empty allows any origin)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 30,
            max_body_size: 1024 * 1024, // 1MB
            cors_origins: vec![],
        }
    }
}

/// Gazetteer and type vocabulary configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Known place names (`.json` array or one entry per line)
    pub gazetteer_path: PathBuf,

    /// Generic location-type words
    pub types_path: PathBuf,

    /// Ignore case when matching entries
    pub case_insensitive: bool,

    /// Only accept matches bounded by non-alphanumeric characters
    pub whole_word: bool,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            gazetteer_path: PathBuf::from("places.json"),
            types_path: PathBuf::from("type.json"),
            case_insensitive: false,
            whole_word: false,
        }
    }
}

/// Sequence labeler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Token-classification endpoint; lexicon-only when unset
    pub endpoint: Option<String>,

    /// Bearer token for the endpoint
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Labels to keep from model output (empty keeps all)
    pub labels: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 30,
            labels: vec![],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
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
}

impl From<ConfigError> for crate::NerError {
    fn from(err: ConfigError) -> Self {
        crate::NerError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.lexicon.gazetteer_path, PathBuf::from("places.json"));
        assert!(!config.lexicon.case_insensitive);
        assert!(config.model.endpoint.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [lexicon]
            gazetteer_path = "data/nepal.txt"
            case_insensitive = true

            [model]
            endpoint = "http://localhost:9000/ner"
            labels = ["LOC", "GPE"]
            "#,
        )
        .unwrap();

        assert_eq!(config.lexicon.gazetteer_path, PathBuf::from("data/nepal.txt"));
        assert_eq!(config.lexicon.types_path, PathBuf::from("type.json"));
        assert!(config.lexicon.case_insensitive);
        assert_eq!(config.model.labels, vec!["LOC", "GPE"]);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(AppConfig::from_toml_str("[server]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/nonexistent/locner.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "Yes".to_string()).unwrap());
        assert!(!parse_bool("X", "0".to_string()).unwrap());
        assert!(parse_bool("X", "maybe".to_string()).is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("LOC, GPE,,"), vec!["LOC", "GPE"]);
        assert!(split_list("").is_empty());
    }
}
