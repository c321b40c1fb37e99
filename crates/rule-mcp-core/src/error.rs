//! Error types for the rule engine
//!
//! Every error carries an [`ErrorKind`] so that outer layers can translate it
//! into their own taxonomy without matching on individual variants.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of an error, independent of any wire representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing required input
    Validation,
    /// Caller is not authenticated
    Unauthorized,
    /// Caller lacks permission
    Forbidden,
    /// Unknown project, rule or method
    NotFound,
    /// Conflicting state
    Conflict,
    /// Well-formed but semantically invalid input
    Unprocessable,
    /// Serialization failure or unexpected storage error
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Unauthorized => write!(f, "unauthorized"),
            ErrorKind::Forbidden => write!(f, "forbidden"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::Unprocessable => write!(f, "unprocessable"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Errors raised by repository implementations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Generic storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite driver error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Seed data could not be read or parsed
    #[error("Seed data error: {0}")]
    Seed(String),

    /// I/O error while reading store files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking storage task panicked or was cancelled
    #[error("Storage task failed: {0}")]
    Task(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Seed(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for RepositoryError {
    fn from(err: serde_yaml::Error) -> Self {
        RepositoryError::Seed(format!("YAML error: {}", err))
    }
}

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// The requested project does not exist
    #[error("project '{0}' not found")]
    ProjectNotFound(String),

    /// No detection strategy produced a project
    #[error("no project could be detected for path '{0}'")]
    NoProjectDetected(String),

    /// Invalid input supplied by the caller
    #[error("invalid input: {0}")]
    Validation(String),

    /// Repository failure, passed through unchanged
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Filesystem failure outside of the repositories
    #[error("filesystem error: {0}")]
    Io(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        CoreError::Internal(msg.into())
    }

    /// The taxonomy bucket this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProjectNotFound(_) | CoreError::NoProjectDetected(_) => ErrorKind::NotFound,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Repository(_) | CoreError::Io(_) | CoreError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Check if this error is the caller's fault (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Unprocessable
        )
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::ProjectNotFound("p1".to_string());
        assert_eq!(err.to_string(), "project 'p1' not found");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(CoreError::ProjectNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::NoProjectDetected("/".into()).kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::validation("bad").kind(), ErrorKind::Validation);
        assert_eq!(
            CoreError::from(RepositoryError::Storage("down".into())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_repository_error_is_transparent() {
        let err = CoreError::from(RepositoryError::Storage("connection refused".into()));
        assert_eq!(err.to_string(), "Storage error: connection refused");
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
        assert_eq!(ErrorKind::Unprocessable.to_string(), "unprocessable");
    }
}
