//! # Environment-Based Configuration
//!
//! Configuration for the Toolgate servers is assembled from defaults,
//! then environment variables, then explicit builder calls (the CLI maps its
//! flags onto the latter).
//!
//! ## Environment Variables
//!
//! - `TOOLGATE_BIND` - HTTP listen address (default: 127.0.0.1:8080)
//! - `TOOLGATE_HEARTBEAT_INTERVAL` - SSE heartbeat period, humantime syntax (default: 30s)
//! - `TOOLGATE_TOOL_TIMEOUT` - Per-call tool execution limit, humantime syntax (default: 30s)
//! - `TOOLGATE_MAX_BODY_SIZE` - Maximum request body size in bytes (default: 1048576 / 1MB)
//! - `TOOLGATE_ENABLE_CORS` - Enable permissive CORS (default: true)
//! - `TOOLGATE_MAX_IN_FLIGHT` - Concurrent requests on the stdio transport (default: 1)
//! - `TOOLGATE_SERVER_NAME` - Name reported by `initialize` (default: toolgate)

use std::net::SocketAddr;
use std::{env, time::Duration};

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Validated server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub heartbeat_interval: Duration,
    pub tool_timeout: Duration,
    pub max_body_size: usize,
    pub enable_cors: bool,
    pub max_in_flight: usize,
    pub server_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            tool_timeout: toolgate_core::DEFAULT_EXECUTION_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            enable_cors: true,
            max_in_flight: 1,
            server_name: "toolgate".to_string(),
        }
    }
}

/// Builder for `ServerConfig` with environment variable support
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    bind: String,
    heartbeat_interval: Duration,
    tool_timeout: Duration,
    max_body_size: usize,
    enable_cors: bool,
    max_in_flight: usize,
    server_name: String,
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        let defaults = ServerConfig::default();
        Self {
            bind: DEFAULT_BIND.to_string(),
            heartbeat_interval: defaults.heartbeat_interval,
            tool_timeout: defaults.tool_timeout,
            max_body_size: defaults.max_body_size,
            enable_cors: defaults.enable_cors,
            max_in_flight: defaults.max_in_flight,
            server_name: defaults.server_name,
        }
    }
}

impl ServerConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any environment variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::default();

        if let Some(bind) = get_env_string("TOOLGATE_BIND") {
            builder = builder.bind(bind);
        }
        if let Some(interval) = get_env_duration("TOOLGATE_HEARTBEAT_INTERVAL")? {
            builder = builder.heartbeat_interval(interval);
        }
        if let Some(timeout) = get_env_duration("TOOLGATE_TOOL_TIMEOUT")? {
            builder = builder.tool_timeout(timeout);
        }
        if let Some(max_size) = get_env_usize("TOOLGATE_MAX_BODY_SIZE")? {
            builder = builder.max_body_size(max_size);
        }
        if let Some(cors) = get_env_bool("TOOLGATE_ENABLE_CORS")? {
            builder = builder.enable_cors(cors);
        }
        if let Some(max_in_flight) = get_env_usize("TOOLGATE_MAX_IN_FLIGHT")? {
            builder = builder.max_in_flight(max_in_flight);
        }
        if let Some(name) = get_env_string("TOOLGATE_SERVER_NAME") {
            builder = builder.server_name(name);
        }

        Ok(builder)
    }

    /// Set the HTTP listen address
    #[must_use]
    pub fn bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    /// Set the interval between SSE heartbeats
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the per-call tool execution limit
    #[must_use]
    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Set maximum request body size in bytes
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Enable or disable CORS
    #[must_use]
    pub fn enable_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// Set how many stdio requests may run at once
    #[must_use]
    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Set the server name reported to clients
    #[must_use]
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Validate configuration and build `ServerConfig`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the configuration is invalid.
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let bind = self.bind.parse::<SocketAddr>().map_err(|e| {
            ConfigError::ValidationError(format!("bind address '{}' is invalid: {e}", self.bind))
        })?;

        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "heartbeat_interval must be greater than 0".to_string(),
            ));
        }
        if self.tool_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "tool_timeout must be greater than 0".to_string(),
            ));
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_body_size must be greater than 0".to_string(),
            ));
        }
        if self.max_body_size > 100 * 1024 * 1024 {
            return Err(ConfigError::ValidationError(
                "max_body_size must be <= 100MB".to_string(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::ValidationError(
                "max_in_flight must be greater than 0".to_string(),
            ));
        }
        if self.server_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server_name cannot be empty".to_string(),
            ));
        }

        Ok(ServerConfig {
            bind,
            heartbeat_interval: self.heartbeat_interval,
            tool_timeout: self.tool_timeout,
            max_body_size: self.max_body_size,
            enable_cors: self.enable_cors,
            max_in_flight: self.max_in_flight,
            server_name: self.server_name,
        })
    }
}

// Environment variable helper functions

fn get_env_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn get_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(val) => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!(
                    "invalid boolean value '{val}', expected true/false/1/0/yes/no/on/off"
                ),
            }),
        },
        Err(_) => Ok(None),
    }
}

fn get_env_usize(key: &str) -> Result<Option<usize>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<usize>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid usize value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

fn get_env_duration(key: &str) -> Result<Option<Duration>, ConfigError> {
    match env::var(key) {
        Ok(val) => humantime::parse_duration(&val)
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid duration '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}
