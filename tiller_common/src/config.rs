//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! across the tiller applications.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tiller_common::config::{ConfigLoader, ConfigError};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct MyAppConfig {
//!     tick_period_ms: u64,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = MyAppConfig::load(Path::new("robot.toml"))?;
//!     println!("tick: {} ms", config.tick_period_ms);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

/// Trait for loading configuration from TOML files.
///
/// Provides a default implementation that works with any type implementing
/// `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
/// - Semantic validation (`ConfigError::ValidationError`) is the loading
///   application's responsibility after `load` returns
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        tick_period_ms: u64,
        name: String,
    }

    #[test]
    fn load_valid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tick_period_ms = 20\nname = \"bench\"").unwrap();

        let config = TestConfig::load(file.path()).unwrap();
        assert_eq!(config.tick_period_ms, 20);
        assert_eq!(config.name, "bench");
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = TestConfig::load(Path::new("/nonexistent/robot.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{not toml").unwrap();

        let result = TestConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn log_level_default_is_info() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn log_level_lowercase_round_trip() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Wrapper {
            level: LogLevel,
        }

        assert_eq!(
            toml::from_str::<Wrapper>("level = \"debug\"").unwrap().level,
            LogLevel::Debug
        );
        assert_eq!(
            toml::from_str::<Wrapper>("level = \"warn\"").unwrap().level,
            LogLevel::Warn
        );
    }
}
