//! Configuration system: TOML file + env var overrides + fixed-layout defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{GraderError, Result};
use crate::core::paths::resolve_under;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cachegrade.toml";

/// Full grader configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub subject: SubjectConfig,
    pub log: LogConfig,
}

/// Fixture layout. Relative entries resolve against `root`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub root: PathBuf,
    pub inputs_dir: PathBuf,
    pub expected_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Where this config was loaded from (informational).
    #[serde(skip)]
    pub config_file: PathBuf,
}

/// How the simulator under test is launched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SubjectConfig {
    /// Resolved against `paths.root`; a bare name is not searched on `PATH`.
    pub executable: PathBuf,
    /// First positional argument handed to the simulator.
    pub replacement_policy: String,
    /// Per-invocation wall-clock bound; 0 disables it.
    pub timeout_secs: u64,
}

/// JSONL activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub jsonl_enabled: bool,
    /// Relative paths resolve against the results directory.
    pub jsonl_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            inputs_dir: PathBuf::from("inputs"),
            expected_dir: PathBuf::from("expected"),
            results_dir: PathBuf::from("test_results"),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("cachesim"),
            replacement_policy: "LRU".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            jsonl_enabled: true,
            jsonl_file: PathBuf::from("activity.jsonl"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| GraderError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(GraderError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // paths
        if let Some(raw) = lookup("CACHEGRADE_PATHS_ROOT") {
            self.paths.root = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CACHEGRADE_PATHS_INPUTS_DIR") {
            self.paths.inputs_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CACHEGRADE_PATHS_EXPECTED_DIR") {
            self.paths.expected_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CACHEGRADE_PATHS_RESULTS_DIR") {
            self.paths.results_dir = PathBuf::from(raw);
        }

        // subject
        if let Some(raw) = lookup("CACHEGRADE_SUBJECT_EXECUTABLE") {
            self.subject.executable = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CACHEGRADE_SUBJECT_REPLACEMENT_POLICY") {
            self.subject.replacement_policy = raw;
        }
        if let Some(raw) = lookup("CACHEGRADE_SUBJECT_TIMEOUT_SECS") {
            self.subject.timeout_secs = parse_env_u64("CACHEGRADE_SUBJECT_TIMEOUT_SECS", &raw)?;
        }

        // log
        if let Some(raw) = lookup("CACHEGRADE_LOG_JSONL_ENABLED") {
            self.log.jsonl_enabled = parse_env_bool("CACHEGRADE_LOG_JSONL_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("CACHEGRADE_LOG_JSONL_FILE") {
            self.log.jsonl_file = PathBuf::from(raw);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("paths.root", &self.paths.root),
            ("paths.inputs_dir", &self.paths.inputs_dir),
            ("paths.expected_dir", &self.paths.expected_dir),
            ("paths.results_dir", &self.paths.results_dir),
            ("subject.executable", &self.subject.executable),
        ] {
            if path.as_os_str().is_empty() {
                return Err(GraderError::InvalidConfig {
                    details: format!("{name} must not be empty"),
                });
            }
        }

        let policy = &self.subject.replacement_policy;
        if policy.is_empty() || policy.chars().any(char::is_whitespace) {
            return Err(GraderError::InvalidConfig {
                details: format!(
                    "subject.replacement_policy must be a single non-empty word, got {policy:?}"
                ),
            });
        }

        if self.log.jsonl_enabled && self.log.jsonl_file.as_os_str().is_empty() {
            return Err(GraderError::InvalidConfig {
                details: "log.jsonl_file must not be empty when log.jsonl_enabled=true"
                    .to_string(),
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn inputs_dir(&self) -> PathBuf {
        resolve_under(&self.paths.root, &self.paths.inputs_dir)
    }

    #[must_use]
    pub fn expected_dir(&self) -> PathBuf {
        resolve_under(&self.paths.root, &self.paths.expected_dir)
    }

    #[must_use]
    pub fn results_dir(&self) -> PathBuf {
        resolve_under(&self.paths.root, &self.paths.results_dir)
    }

    #[must_use]
    pub fn executable(&self) -> PathBuf {
        resolve_under(&self.paths.root, &self.subject.executable)
    }

    /// Activity log path, or `None` when the log is disabled.
    #[must_use]
    pub fn jsonl_log(&self) -> Option<PathBuf> {
        self.log
            .jsonl_enabled
            .then(|| resolve_under(&self.results_dir(), &self.log.jsonl_file))
    }

    /// Per-invocation timeout, or `None` when disabled.
    #[must_use]
    pub fn subject_timeout(&self) -> Option<Duration> {
        (self.subject.timeout_secs > 0).then(|| Duration::from_secs(self.subject.timeout_secs))
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| GraderError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| GraderError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
