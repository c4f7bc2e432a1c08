//! Configuration management for logsink
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use logsink::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `LOGSINK__<section>__<key>`:
//! - `LOGSINK__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `LOGSINK__DATABASE__RETRY__MAX_ATTEMPTS=5`
//!
//! The deployment variables `APP_HOST`, `APP_PORT`, `DB_HOST`, `DB_PORT`,
//! `DB_USERNAME` and `DB_PASSWORD` take precedence over everything else.
//! The database password can only be set through `DB_PASSWORD`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/logsink.toml`.
//! This can be overridden using the `LOGSINK_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, DatabaseConfig, ServerConfig, TelemetryConfig};
pub use sources::apply_env_overrides;
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - A deployment variable cannot be parsed
    /// - Validation fails
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Same as [`Config::load`], reading the TOML file from `config_path` when given
    pub fn load_with(config_path: Option<std::path::PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(config_path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files. Plain deployment
    /// variables are not applied.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[database]\nhost = \"db\"\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.port, 5432);
    }

    #[test]
    fn test_validation_runs_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[database]
schema = "bad schema"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[database\nhost = ").unwrap();

        assert!(matches!(
            Config::load_from_path(config_path),
            Err(ConfigError::LoadError(_))
        ));
    }
}
