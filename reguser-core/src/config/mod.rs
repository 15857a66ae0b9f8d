//! Configuration management for reguser
//!
//! Configuration comes from defaults, an optional TOML file, and
//! `REGUSER_<SECTION>_<KEY>` environment overrides, in that order.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::ConfigError;

use crate::store::{DEFAULT_SEARCH_TIMEOUT, DEFAULT_STREAM_BUFFER};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Shared credential for the API
    pub auth: AuthConfig,

    /// Store configuration
    pub store: StoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// How long in-flight requests get to finish after shutdown starts
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

/// Basic-auth credential accepted by every route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Wall-clock budget of a single search or listing stream
    #[serde(with = "humantime_serde")]
    pub search_timeout: Duration,

    /// Capacity of every result buffer
    pub stream_buffer: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Register metric descriptions at startup
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8000)),
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Parse an environment variable if it is set
fn env_parse<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                var,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn env_duration(var: &'static str) -> Result<Option<Duration>, ConfigError> {
    match env::var(var) {
        Ok(raw) => humantime::parse_duration(&raw)
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                var,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from defaults plus environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::parse_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::parse_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Overlay `REGUSER_*` environment variables
    ///
    /// Example: REGUSER_SERVER_BIND_ADDRESS=127.0.0.1:8080
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(addr) = env_parse("REGUSER_SERVER_BIND_ADDRESS")? {
            self.server.bind_address = addr;
        }
        if let Some(timeout) = env_duration("REGUSER_SERVER_SHUTDOWN_TIMEOUT")? {
            self.server.shutdown_timeout = timeout;
        }

        if let Ok(username) = env::var("REGUSER_AUTH_USERNAME") {
            self.auth.username = username;
        }
        if let Ok(password) = env::var("REGUSER_AUTH_PASSWORD") {
            self.auth.password = password;
        }

        if let Some(timeout) = env_duration("REGUSER_STORE_SEARCH_TIMEOUT")? {
            self.store.search_timeout = timeout;
        }
        if let Some(buffer) = env_parse("REGUSER_STORE_STREAM_BUFFER")? {
            self.store.stream_buffer = buffer;
        }

        if let Ok(level) = env::var("REGUSER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = env_parse("REGUSER_LOG_JSON")? {
            self.logging.json_format = json;
        }

        if let Some(enabled) = env_parse("REGUSER_METRICS_ENABLED")? {
            self.metrics.enabled = enabled;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.stream_buffer == 0 {
            return Err(ConfigError::ValidationFailed(
                "stream_buffer must be greater than 0".to_string(),
            ));
        }

        if self.store.search_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "search_timeout must be greater than 0".to_string(),
            ));
        }

        if self.auth.username.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "auth username must not be empty".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.search_timeout, Duration::from_secs(2));
        assert_eq!(config.store.stream_buffer, 100);
        assert_eq!(config.auth.username, "admin");
        assert_eq!(config.server.bind_address.port(), 8000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.store.stream_buffer = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.store.search_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        config = Config::default();
        config.auth.username.clear();
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reguser.toml");

        let mut config = Config::default();
        config.store.search_timeout = Duration::from_millis(1500);
        config.auth.password = "s3cret".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.store, config.store);
        assert_eq!(loaded.auth.password, "s3cret");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[store]\nsearch_timeout = \"5s\"\n").unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.store.search_timeout, Duration::from_secs(5));
        assert_eq!(loaded.store.stream_buffer, 100);
        assert_eq!(loaded.auth.username, "admin");
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("REGUSER_STORE_STREAM_BUFFER", "7");
        env::set_var("REGUSER_STORE_SEARCH_TIMEOUT", "250ms");
        let config = Config::from_env().unwrap();
        assert_eq!(config.store.stream_buffer, 7);
        assert_eq!(config.store.search_timeout, Duration::from_millis(250));

        env::set_var("REGUSER_STORE_STREAM_BUFFER", "lots");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: "REGUSER_STORE_STREAM_BUFFER",
                ..
            }
        ));

        env::remove_var("REGUSER_STORE_STREAM_BUFFER");
        env::remove_var("REGUSER_STORE_SEARCH_TIMEOUT");
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/reguser.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[store\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
