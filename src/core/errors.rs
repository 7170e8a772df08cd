//! CSG-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::grading::invoke::ProcessError;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, GraderError>;

/// Top-level error type for the grader. Every variant means grading could not
/// run; subject misbehavior is scored, never raised.
#[derive(Debug, Error)]
pub enum GraderError {
    #[error("[CSG-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CSG-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CSG-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CSG-2001] fixture directory not found: {path}")]
    MissingDirectory { path: PathBuf },

    #[error("[CSG-2002] fixture pattern failure for {input}: {details}")]
    Pattern { input: String, details: String },

    #[error("[CSG-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CSG-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CSG-3003] subject invocation failure: {0}")]
    Subject(#[from] ProcessError),

    #[error("[CSG-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl GraderError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CSG-1001",
            Self::MissingConfig { .. } => "CSG-1002",
            Self::ConfigParse { .. } => "CSG-1003",
            Self::MissingDirectory { .. } => "CSG-2001",
            Self::Pattern { .. } => "CSG-2002",
            Self::Serialization { .. } => "CSG-2101",
            Self::Io { .. } => "CSG-3002",
            Self::Subject(_) => "CSG-3003",
            Self::Runtime { .. } => "CSG-3900",
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for GraderError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for GraderError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
