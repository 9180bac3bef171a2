use serde::{Deserialize, Serialize};

use super::proposal::{RebaseFailure, RebaseStrategy};

/// Main configuration structure for fleetprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Remote pipeline classifier configuration
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Extraction pipeline configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Rebase policy for landing convergence changes
    #[serde(default)]
    pub rebase: RebaseConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Remote classifier (East pipeline deployer) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClassifierConfig {
    /// Whether the remote lookup is attempted at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Scheme and host of the deployer, without trailing slash
    #[serde(default = "default_classifier_base_url")]
    pub base_url: String,

    /// Path segment appended after `<owner>/<repo>/`
    #[serde(default = "default_classifier_path")]
    pub path: String,

    /// Substring in the response body that means "uses this pipeline"
    #[serde(default = "default_affirmative_marker")]
    pub affirmative_marker: String,

    /// Transport timeout for the single lookup request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport-level retries; zero keeps the lookup a single request
    #[serde(default)]
    pub max_retries: u32,
}

const fn default_true() -> bool {
    true
}

fn default_classifier_base_url() -> String {
    "https://eastpipeline.yo".to_string()
}

fn default_classifier_path() -> String {
    "doesThisWork".to_string()
}

fn default_affirmative_marker() -> String {
    "found".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_classifier_base_url(),
            path: default_classifier_path(),
            affirmative_marker: default_affirmative_marker(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

/// Extraction pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExtractionConfig {
    /// Names of the aspects to run; empty runs every registered aspect
    #[serde(default)]
    pub aspects: Vec<String>,

    /// Repositories extracted concurrently during a fleet run
    #[serde(default = "default_max_concurrent_repos")]
    pub max_concurrent_repos: usize,
}

const fn default_max_concurrent_repos() -> usize {
    8
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            aspects: Vec::new(),
            max_concurrent_repos: default_max_concurrent_repos(),
        }
    }
}

/// Rebase policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RebaseConfig {
    /// Rebase proposals whose base branch has advanced
    #[serde(default = "default_true")]
    pub rebase: bool,

    /// Conflict resolution side while rebasing
    #[serde(default)]
    pub strategy: RebaseStrategy,

    /// What to do with a proposal that cannot be landed
    #[serde(default)]
    pub on_failure: RebaseFailure,

    /// Branch proposals land on when none is given
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
}

fn default_base_branch() -> String {
    "main".to_string()
}

impl Default for RebaseConfig {
    fn default() -> Self {
        Self {
            rebase: true,
            strategy: RebaseStrategy::default(),
            on_failure: RebaseFailure::default(),
            base_branch: default_base_branch(),
        }
    }
}
