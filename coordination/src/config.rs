//! Run configuration
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! environment variables. The binary applies CLI flags last.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `VOTE_MODELS` | `models` (comma-separated) |
//! | `VOTE_ROLES` | `roles` (comma-separated, may be empty) |
//! | `VOTE_WORKERS` | `worker_count` |
//! | `OLLAMA_HOST` | `backend_base_url` |
//! | `VOTE_REQUEST_TIMEOUT_SECS` | `request_timeout_secs` |
//! | `VOTE_SHARDING` | `sharding` |

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::distribution::ShardingScheme;

/// Default Ollama endpoint
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// Upper bound on `worker_count`; each worker is a spawned task with its own shard
pub const MAX_WORKERS: usize = 4096;

/// Error type for configuration loading and validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("At least one model must be configured")]
    NoModels,

    #[error("Worker count must be at least 1")]
    NoWorkers,

    #[error("Worker count {0} exceeds the maximum of {max}", max = MAX_WORKERS)]
    TooManyWorkers(usize),

    #[error("Backend base URL must not be empty")]
    EmptyBaseUrl,

    #[error("Blank {0} name in configuration")]
    BlankName(&'static str),

    #[error("Duplicate {kind} '{name}' in configuration")]
    Duplicate { kind: &'static str, name: String },
}

/// Everything a voting run needs to know up front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteConfig {
    /// Backend models queried for every statement
    pub models: Vec<String>,
    /// Expert personas for layer-3 queries
    pub roles: Vec<String>,
    /// Number of concurrent workers
    pub worker_count: usize,
    /// Model server base URL
    pub backend_base_url: String,
    /// Per-request transport timeout
    pub request_timeout_secs: u64,
    /// How tasks are split across workers
    pub sharding: ShardingScheme,
    /// Statements file, one per line
    pub input_path: PathBuf,
    /// Where to write the JSON report, if anywhere
    pub output_path: Option<PathBuf>,
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            models: vec!["llama3".into(), "phi".into(), "gemma".into()],
            roles: vec!["Engineer".into(), "Philosophy Professor".into()],
            worker_count: 4,
            backend_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 300,
            sharding: ShardingScheme::TailRemainder,
            input_path: PathBuf::from("data/prompts.txt"),
            output_path: None,
        }
    }
}

impl VoteConfig {
    /// Load a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Overlay variables from `lookup` onto this config
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(models) = lookup("VOTE_MODELS") {
            self.models = split_list(&models);
        }
        if let Some(roles) = lookup("VOTE_ROLES") {
            self.roles = split_list(&roles);
        }
        if let Some(workers) = lookup("VOTE_WORKERS") {
            match workers.trim().parse() {
                Ok(n) => self.worker_count = n,
                Err(_) => warn!(value = %workers, "Ignoring invalid VOTE_WORKERS"),
            }
        }
        if let Some(url) = lookup("OLLAMA_HOST") {
            self.backend_base_url = url.trim().to_string();
        }
        if let Some(secs) = lookup("VOTE_REQUEST_TIMEOUT_SECS") {
            match secs.trim().parse() {
                Ok(n) => self.request_timeout_secs = n,
                Err(_) => warn!(value = %secs, "Ignoring invalid VOTE_REQUEST_TIMEOUT_SECS"),
            }
        }
        if let Some(scheme) = lookup("VOTE_SHARDING") {
            match scheme.parse() {
                Ok(s) => self.sharding = s,
                Err(e) => warn!(error = %e, "Ignoring invalid VOTE_SHARDING"),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reject configurations that cannot produce a meaningful run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.worker_count > MAX_WORKERS {
            return Err(ConfigError::TooManyWorkers(self.worker_count));
        }
        if self.backend_base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        check_names("model", &self.models)?;
        check_names("role", &self.roles)?;
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn check_names(kind: &'static str, names: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(ConfigError::BlankName(kind));
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind,
                name: name.clone(),
            });
        }
    }
    Ok(())
}
