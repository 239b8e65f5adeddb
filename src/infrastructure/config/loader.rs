use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Cache path cannot be empty for the sqlite cache backend")]
    EmptyCachePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid entry_ttl_secs: {0}. Must be at least 1")]
    InvalidEntryTtl(u64),

    #[error("Invalid sweep_interval_secs: {0}. Must be at least 1")]
    InvalidSweepInterval(u64),

    #[error("Invalid lock_ttl_ms: {0}. Must be at least 1")]
    InvalidLockTtl(u64),

    #[error("Invalid retry_delay_ms: {0}. Must be at least 1")]
    InvalidRetryDelay(u64),

    #[error(
        "Invalid stampede policy: loser wait ({wait_ms}ms) must be shorter than lock_ttl_ms ({lock_ttl_ms}ms)"
    )]
    WaitExceedsLease { wait_ms: u64, lock_ttl_ms: u64 },
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .thunderguard/config.yaml (project config)
    /// 3. .thunderguard/local.yaml (local overrides, optional)
    /// 4. Environment variables (THUNDERGUARD_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".thunderguard/config.yaml"))
            .merge(Yaml::file(".thunderguard/local.yaml"))
            .merge(Env::prefixed("THUNDERGUARD_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("THUNDERGUARD_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
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

        if config.cache.backend == crate::domain::models::CacheBackend::Sqlite
            && config.cache.path.is_empty()
        {
            return Err(ConfigError::EmptyCachePath);
        }

        if config.cache.entry_ttl_secs == 0 {
            return Err(ConfigError::InvalidEntryTtl(config.cache.entry_ttl_secs));
        }

        if config.cache.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidSweepInterval(config.cache.sweep_interval_secs));
        }

        let stampede = &config.stampede;
        if stampede.lock_ttl_ms == 0 {
            return Err(ConfigError::InvalidLockTtl(stampede.lock_ttl_ms));
        }

        if stampede.retry_delay_ms == 0 {
            return Err(ConfigError::InvalidRetryDelay(stampede.retry_delay_ms));
        }

        // A lease that can expire while losers still wait lets a second
        // winner in before the first has backfilled.
        let wait_ms = stampede.retry_delay_ms.saturating_mul(u64::from(stampede.retry_attempts));
        if wait_ms >= stampede.lock_ttl_ms {
            return Err(ConfigError::WaitExceedsLease {
                wait_ms,
                lock_ttl_ms: stampede.lock_ttl_ms,
            });
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{CacheBackend, StampedeConfig};
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, ".thunderguard/products.db");
        assert_eq!(config.cache.backend, CacheBackend::Sqlite);
        assert_eq!(config.cache.entry_ttl_secs, 600);
        assert_eq!(config.cache.sweep_interval_secs, 60);
        assert_eq!(config.stampede.lock_ttl_ms, 10_000);
        assert_eq!(config.stampede.retry_attempts, 10);
        assert_eq!(config.stampede.retry_delay_ms, 100);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/products.db
  max_connections: 5
cache:
  backend: memory
  entry_ttl_secs: 120
stampede:
  lock_ttl_ms: 5000
  retry_attempts: 20
  retry_delay_ms: 50
server:
  port: 9000
logging:
  level: debug
  format: pretty
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.database.path, "/custom/products.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.entry_ttl_secs, 120);
        assert_eq!(config.stampede.retry_attempts, 20);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.logging.format, "pretty");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_lock_ttl() {
        let config = Config {
            stampede: StampedeConfig {
                lock_ttl_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLockTtl(0))
        ));
    }

    #[test]
    fn test_validate_wait_longer_than_lease() {
        let config = Config {
            stampede: StampedeConfig {
                lock_ttl_ms: 500,
                retry_attempts: 10,
                retry_delay_ms: 100,
            },
            ..Default::default()
        };

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::WaitExceedsLease { wait_ms: 1000, lock_ttl_ms: 500 })
        ));
    }

    #[test]
    fn test_validate_zero_sweep_interval() {
        let mut config = Config::default();
        config.cache.sweep_interval_secs = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSweepInterval(0))
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_load_from_file_with_env_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stampede:\n  retry_attempts: 5\nserver:\n  port: 9100").unwrap();

        temp_env::with_var("THUNDERGUARD_SERVER__PORT", Some("9200"), || {
            let config = ConfigLoader::load_from_file(file.path()).unwrap();
            assert_eq!(config.stampede.retry_attempts, 5);
            assert_eq!(config.server.port, 9200);
        });
    }
}
