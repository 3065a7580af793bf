use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarlError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Repository definition failed validation: {}", join_violations(.0))]
    Schema(Vec<SchemaViolation>),

    #[error("Repository name mismatch: expected '{expected}', found '{found}'")]
    NameMismatch { expected: String, found: String },

    #[error("Package '{package}' declares cli '{cli}' but has no file with that path")]
    MissingCliFile { package: String, cli: String },

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Package '{package}' not found in repository '{repository}'")]
    PackageNotFound { repository: String, package: String },

    #[error("Cache operation failed: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CarlError {
    pub fn fetch(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            status: None,
            reason: reason.to_string(),
        }
    }
}

/// A single failed constraint, located by a path such as `packages[0].version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
