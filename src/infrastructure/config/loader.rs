//! Layered configuration loading and validation.

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::{Config, STORE_BATCH_LIMIT};

/// Project-local directory holding config and the default database.
pub const CONFIG_DIR: &str = ".advisor-cache";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown `logging.level`
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Unknown `logging.format`
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// Unknown `logging.rotation`
    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    /// `database.path` is blank
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    /// `database.max_connections` is zero
    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    /// `cache.namespace_prefix` is blank
    #[error("Cache namespace_prefix cannot be empty")]
    EmptyNamespace,

    /// A TTL or interval is zero
    #[error("Invalid {0}: must be greater than zero")]
    ZeroDuration(&'static str),

    /// `batch.max_operations` is outside the store's limit
    #[error("Invalid batch max_operations: {0}. Must be between 1 and {STORE_BATCH_LIMIT}")]
    InvalidBatchSize(usize),

    /// A default limit is zero
    #[error("Invalid {0}: must be at least 1")]
    ZeroLimit(&'static str),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .advisor-cache/config.yaml (project config, created by init)
    /// 3. .advisor-cache/local.yaml (local overrides, optional)
    /// 4. Environment variables (ADVISOR_CACHE_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(format!("{CONFIG_DIR}/config.yaml")))
            .merge(Yaml::file(format!("{CONFIG_DIR}/local.yaml")))
            .merge(Env::prefixed("ADVISOR_CACHE_").split("__"))
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Check a batch chunk size against the store's per-batch limit.
    pub fn validate_batch_size(max_operations: usize) -> Result<(), ConfigError> {
        if max_operations == 0 || max_operations > STORE_BATCH_LIMIT {
            return Err(ConfigError::InvalidBatchSize(max_operations));
        }
        Ok(())
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        let cache = &config.cache;
        if cache.namespace_prefix.is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        let durations = [
            ("sweep_interval_secs", cache.sweep_interval_secs),
            ("advisor_ttl_secs", cache.advisor_ttl_secs),
            ("search_ttl_secs", cache.search_ttl_secs),
            ("suggestions_ttl_secs", cache.suggestions_ttl_secs),
            ("user_profile_ttl_secs", cache.user_profile_ttl_secs),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::ZeroDuration(name));
        }

        Self::validate_batch_size(config.batch.max_operations)?;

        if config.fetch.default_search_limit == 0 {
            return Err(ConfigError::ZeroLimit("default_search_limit"));
        }
        if config.fetch.default_suggestion_limit == 0 {
            return Err(ConfigError::ZeroLimit("default_suggestion_limit"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ResourceKind;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, ".advisor-cache/advisor-cache.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.cache.namespace_prefix, "cache_");
        assert_eq!(config.batch.max_operations, 450);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/path.db
  max_connections: 3
logging:
  level: debug
  format: json
cache:
  advisor_ttl_secs: 120
  sweep_on_startup: false
batch:
  max_operations: 200
fetch:
  fallback_on_permission_denied: true
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.database.path, "/custom/path.db");
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.retention_days, 30);
        assert_eq!(
            config.cache.ttl_for(ResourceKind::AdvisorProfile),
            Duration::from_secs(120)
        );
        assert_eq!(
            config.cache.ttl_for(ResourceKind::SearchResults),
            Duration::from_secs(900)
        );
        assert!(!config.cache.sweep_on_startup);
        assert_eq!(config.batch.max_operations, 200);
        assert!(config.fetch.fallback_on_permission_denied);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_invalid_rotation() {
        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidRotation(_)
        ));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.database.path = String::new();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyDatabasePath
        ));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = Config::default();
        config.database.max_connections = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxConnections(0)
        ));
    }

    #[test]
    fn test_validate_empty_namespace() {
        let mut config = Config::default();
        config.cache.namespace_prefix = String::new();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyNamespace
        ));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = Config::default();
        config.cache.search_ttl_secs = 0;

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::ZeroDuration(name) => assert_eq!(name, "search_ttl_secs"),
            other => panic!("Expected ZeroDuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_batch_size_bounds() {
        let mut config = Config::default();
        config.batch.max_operations = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidBatchSize(0)
        ));

        config.batch.max_operations = 501;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidBatchSize(501)
        ));

        config.batch.max_operations = 500;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_limits() {
        let mut config = Config::default();
        config.fetch.default_suggestion_limit = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::ZeroLimit("default_suggestion_limit")
        ));
    }

    #[test]
    fn test_env_override() {
        temp_env::with_vars(
            [
                ("ADVISOR_CACHE_LOGGING__LEVEL", Some("debug")),
                ("ADVISOR_CACHE_CACHE__ADVISOR_TTL_SECS", Some("60")),
            ],
            || {
                let config: Config = ConfigLoader::figment().extract().unwrap();
                assert_eq!(config.logging.level, "debug");
                assert_eq!(config.cache.advisor_ttl_secs, 60);
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "batch:\n  max_operations: 100\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "batch:\n  max_operations: 300\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.batch.max_operations, 300, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }

    #[test]
    fn test_load_from_file_validates() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cache:\n  sweep_interval_secs: 0").unwrap();
        file.flush().unwrap();

        let err = ConfigLoader::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("sweep_interval_secs"));
    }
}
