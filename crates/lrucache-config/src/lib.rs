//! Layered configuration for the lrucache tools.
//!
//! Values are resolved from, lowest to highest precedence:
//! built-in defaults, a TOML file, then `LRUCACHE__`-prefixed environment
//! variables (`LRUCACHE__CACHE__CAPACITY=64`). Command-line overrides are
//! applied by the caller and re-checked with [`Config::validate`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "lrucache.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "LRUCACHE";

pub const DEFAULT_CAPACITY: usize = 1024;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_STRESS_WORKERS: usize = 8;
pub const DEFAULT_STRESS_OPS: usize = 1000;

/// Errors raised while loading or checking configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub stress: StressConfig,
}

/// Cache sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of resident entries.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Defaults for the `stress` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressConfig {
    /// Number of concurrent workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Operations issued by each worker.
    #[serde(default = "default_ops")]
    pub ops_per_worker: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_workers() -> usize {
    DEFAULT_STRESS_WORKERS
}

fn default_ops() -> usize {
    DEFAULT_STRESS_OPS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_STRESS_WORKERS,
            ops_per_worker: DEFAULT_STRESS_OPS,
        }
    }
}

impl Config {
    /// Loads configuration from defaults, a TOML file and the environment.
    ///
    /// An explicit `path` must exist. Without one, `lrucache.toml` in the
    /// working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("cache.capacity", DEFAULT_CAPACITY as i64)?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?
            .set_default("stress.workers", DEFAULT_STRESS_WORKERS as i64)?
            .set_default("stress.ops_per_worker", DEFAULT_STRESS_OPS as i64)?;

        builder = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                builder.add_source(
                    config::File::from(path)
                        .format(config::FileFormat::Toml)
                        .required(true),
                )
            }
            None => builder.add_source(
                config::File::from(Path::new(DEFAULT_CONFIG_FILE))
                    .format(config::FileFormat::Toml)
                    .required(false),
            ),
        };

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string, filling unset fields with
    /// defaults. The environment is not consulted.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the cache or stress runner cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache.capacity must be at least 1".to_string(),
            ));
        }
        if self.stress.workers == 0 {
            return Err(ConfigError::Invalid(
                "stress.workers must be at least 1".to_string(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Overrides the cache capacity, as a `--capacity` flag would.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.cache.capacity = capacity;
        self
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.stress.workers, DEFAULT_STRESS_WORKERS);
        assert_eq!(config.stress.ops_per_worker, DEFAULT_STRESS_OPS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_fills_missing_sections() {
        let config = Config::from_toml("[cache]\ncapacity = 16\n").unwrap();
        assert_eq!(config.cache.capacity, 16);
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.stress, StressConfig::default());
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        let err = Config::from_toml("[cache]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_workers_is_invalid() {
        let config = Config {
            stress: StressConfig {
                workers: 0,
                ops_per_worker: 1,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_capacity_override() {
        let config = Config::default().with_capacity(3);
        assert_eq!(config.cache.capacity, 3);
        assert!(Config::default().with_capacity(0).validate().is_err());
    }

    #[test]
    fn test_to_toml_contains_sections() {
        let rendered = Config::default().with_capacity(42).to_toml().unwrap();
        assert!(rendered.contains("[cache]"));
        assert!(rendered.contains("capacity = 42"));
        assert!(rendered.contains("[stress]"));

        let reparsed = Config::from_toml(&rendered).unwrap();
        assert_eq!(reparsed.cache.capacity, 42);
    }
}
