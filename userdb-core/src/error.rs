//! Structured error types for userdb-core.
//!
//! Library consumers get a matchable enum; the binary wraps it in `anyhow`
//! for context.

use thiserror::Error;

/// Main error type for userdb-core operations
#[derive(Error, Debug)]
pub enum DbError {
    /// Driver-level failure (connectivity, constraint violation, protocol)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// API misuse, e.g. creating a command on a finalized transaction
    #[error("invalid usage: {reason}")]
    Usage { reason: String },

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} '{id}' already exists")]
    Conflict { resource: &'static str, id: String },

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for userdb-core operations
pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Create a usage error
    pub fn usage(reason: impl Into<String>) -> Self {
        Self::Usage {
            reason: reason.into(),
        }
    }

    /// Create a not-found error for a resource
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Create a conflict error for a resource
    pub fn conflict(resource: &'static str, id: impl ToString) -> Self {
        Self::Conflict {
            resource,
            id: id.to_string(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::not_found("user", "42");
        assert_eq!(err.to_string(), "not found: user '42'");

        let err = DbError::conflict("user", "42");
        assert_eq!(err.to_string(), "conflict: user '42' already exists");

        let err = DbError::usage("transaction already committed");
        assert!(err.to_string().starts_with("invalid usage"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: DbError = sqlx::Error::RowNotFound.into();

        assert!(matches!(err, DbError::Sqlx(sqlx::Error::RowNotFound)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_classifiers() {
        assert!(DbError::usage("x").is_usage());
        assert!(DbError::not_found("user", 1).is_not_found());
        assert!(DbError::conflict("user", 1).is_conflict());
        assert!(!DbError::config("x").is_usage());
    }
}
