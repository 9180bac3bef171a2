use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project directory holding configuration files.
pub const CONFIG_DIR: &str = ".fleetprint";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "FLEETPRINT_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Classifier base_url cannot be empty")]
    EmptyClassifierUrl,

    #[error("Classifier affirmative_marker cannot be empty")]
    EmptyAffirmativeMarker,

    #[error("Invalid classifier timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid max_concurrent_repos: {0}. Must be at least 1")]
    InvalidConcurrency(usize),

    #[error("Rebase base_branch cannot be empty")]
    EmptyBaseBranch,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the project in the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .fleetprint/config.yaml
    /// 3. .fleetprint/local.yaml (optional, untracked overrides)
    /// 4. Environment variables (FLEETPRINT_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same as [`load`](Self::load) for the project rooted at `root`.
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Config> {
        let dir = root.as_ref().join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
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
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.classifier.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyClassifierUrl);
        }

        if config.classifier.affirmative_marker.is_empty() {
            return Err(ConfigError::EmptyAffirmativeMarker);
        }

        if config.classifier.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.classifier.timeout_secs));
        }

        if config.extraction.max_concurrent_repos == 0 {
            return Err(ConfigError::InvalidConcurrency(
                config.extraction.max_concurrent_repos,
            ));
        }

        if config.rebase.base_branch.trim().is_empty() {
            return Err(ConfigError::EmptyBaseBranch);
        }

        Ok(())
    }
}
