// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::imaging::TransformSettings;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub resizer: ResizerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the resize stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResizerConfig {
    /// JPEG quality 0-100 (0 encodes as 1); unset keeps the mode's choice or the encoder default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_quality: Option<u8>,
    /// Emit a debug trace for every processed payload
    #[serde(default)]
    pub debug: bool,
    /// Concurrent transformations allowed on the worker pool
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Give up waiting for a worker after this many milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Reject sources whose header reports more pixels than this
    #[serde(default = "default_max_source_pixels")]
    pub max_source_pixels: u64,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_max_source_pixels() -> u64 {
    100_000_000 // 10000x10000
}

impl Default for ResizerConfig {
    fn default() -> Self {
        Self {
            image_quality: None,
            debug: false,
            workers: default_workers(),
            timeout_ms: None,
            max_source_pixels: default_max_source_pixels(),
        }
    }
}

impl ResizerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Knobs the executor applies around each mode call
    pub fn transform_settings(&self) -> TransformSettings {
        TransformSettings {
            quality: self.image_quality,
            max_source_pixels: Some(self.max_source_pixels),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let mut substituted = String::with_capacity(yaml.len());
        let mut last = 0;
        for caps in re.captures_iter(yaml) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = std::env::var(name.as_str())
                .map_err(|_| ConfigError::MissingEnvVar(name.as_str().to_string()))?;
            substituted.push_str(&yaml[last..whole.start()]);
            substituted.push_str(&value);
            last = whole.end();
        }
        substituted.push_str(&yaml[last..]);

        // An empty document means "all defaults"
        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(quality) = self.resizer.image_quality {
            if quality > 100 {
                return Err(ConfigError::Invalid(format!(
                    "resizer.image_quality must be between 0 and 100, got {}",
                    quality
                )));
            }
        }

        if self.resizer.workers == 0 {
            return Err(ConfigError::Invalid(
                "resizer.workers must be at least 1".to_string(),
            ));
        }

        if self.resizer.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "resizer.timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.resizer.max_source_pixels == 0 {
            return Err(ConfigError::Invalid(
                "resizer.max_source_pixels must be greater than 0".to_string(),
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "logging.level cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
