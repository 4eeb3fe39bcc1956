//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{McuLinkError, Result};
use crate::proto::protocol::MAX_PAYLOAD;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub protocol: ProtocolConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// Protocol configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProtocolConfig {
    /// Largest payload the attached device accepts (never above the wire maximum)
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,

    /// Idle gap after which a partially received frame is abandoned (0 disables)
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log every frame as hex at debug level
    #[serde(default)]
    pub hex_dump: bool,
}

/// Stdin/stdout bridge configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    #[serde(default = "default_input_format")]
    pub input_format: InputFormat,
}

/// How the bridge interprets each input line
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// JSON lines are descriptors, everything else is hex
    Auto,
    /// Every line is a JSON command descriptor
    Json,
    /// Every line is hex-encoded received bytes
    Hex,
}

// Default value functions
fn default_max_payload_size() -> usize { MAX_PAYLOAD }

fn default_receive_timeout_ms() -> u64 { 100 }

fn default_log_level() -> String { "info".to_string() }

fn default_input_format() -> InputFormat { InputFormat::Auto }

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_payload_size: default_max_payload_size(),
            receive_timeout_ms: default_receive_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            hex_dump: false,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            input_format: default_input_format(),
        }
    }
}

impl ProtocolConfig {
    /// Receive timeout, `None` when disabled
    pub fn receive_timeout(&self) -> Option<Duration> {
        (self.receive_timeout_ms > 0).then(|| Duration::from_millis(self.receive_timeout_ms))
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mcu_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.protocol.max_payload_size == 0 || self.protocol.max_payload_size > MAX_PAYLOAD {
            return Err(McuLinkError::Config(
                toml::de::Error::custom(format!(
                    "max_payload_size must be between 1 and {}",
                    MAX_PAYLOAD
                ))
            ));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(McuLinkError::Config(
                toml::de::Error::custom("log level must be one of: trace, debug, info, warn, error")
            ));
        }

        Ok(())
    }
}
