use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 2] = ["json", "pretty"];
const VALID_ROTATIONS: [&str; 3] = ["daily", "hourly", "never"];

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database URL cannot be empty")]
    EmptyDatabaseUrl,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid {0}: must be at least 1 second")]
    InvalidTimeout(&'static str),

    #[error("Invalid server port: 0")]
    InvalidPort,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. taskcache.yaml
    /// 3. taskcache.local.yaml (optional local overrides)
    /// 4. Environment variables (`TASKCACHE_*`, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("taskcache.yaml"))
            .merge(Yaml::file("taskcache.local.yaml"))
            .merge(Env::prefixed("TASKCACHE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if config.database.url.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }
        if config.database.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("database.request_timeout_secs"));
        }
        if config.cache.preload_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("cache.preload_timeout_secs"));
        }

        if !VALID_LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        if !VALID_LOG_FORMATS.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }
        if !VALID_ROTATIONS.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3003);
        assert_eq!(config.database.url, "sqlite:.taskcache/tasks.db");
        assert_eq!(config.database.request_timeout_secs, 5);
        assert!(config.cache.preload_on_startup);
        assert!(!config.cache.abort_on_preload_failure);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
server:
  port: 8080
database:
  url: "sqlite::memory:"
  max_connections: 2
cache:
  abort_on_preload_failure: true
logging:
  level: debug
  format: pretty
"#;

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 2);
        assert!(config.cache.abort_on_preload_failure);
        assert!(config.cache.preload_on_startup);
        assert_eq!(config.logging.format, "pretty");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "loud"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format_and_rotation() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogFormat(_))));

        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidRotation(_))));
    }

    #[test]
    fn test_validate_database_settings() {
        let mut config = Config::default();
        config.database.url = String::new();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::EmptyDatabaseUrl)));

        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConnections(0))
        ));
    }

    #[test]
    fn test_validate_zero_timeouts_and_port() {
        let mut config = Config::default();
        config.database.request_timeout_secs = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidTimeout(_))));

        let mut config = Config::default();
        config.cache.preload_timeout_secs = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidTimeout(_))));

        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidPort)));
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "database:\n  url: sqlite:/tmp/other.db\nlogging:\n  level: warn").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();

        assert_eq!(config.database.url, "sqlite:/tmp/other.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: verbose").unwrap();
        file.flush().unwrap();

        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_env_override() {
        temp_env::with_vars(
            [
                ("TASKCACHE_SERVER__PORT", Some("8088")),
                ("TASKCACHE_CACHE__PRELOAD_ON_STARTUP", Some("false")),
                ("TASKCACHE_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config = ConfigLoader::load().unwrap();
                assert_eq!(config.server.port, 8088);
                assert!(!config.cache.preload_on_startup);
                assert_eq!(config.logging.level, "debug");
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(base_file, "server:\n  port: 4000\nlogging:\n  level: info\n  format: pretty").unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "server:\n  port: 5000\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.server.port, 5000, "Override should win");
        assert_eq!(config.logging.level, "debug", "Override should win for nested fields");
        assert_eq!(config.logging.format, "pretty", "Base value should persist when not overridden");
    }
}
