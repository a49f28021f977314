//! Error types for repository operations.

use oxide_repo_core::DialectCapabilityError;
use thiserror::Error;

/// Repository errors.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Schema, type, dialect or compilation error.
    #[error(transparent)]
    Core(#[from] oxide_repo_core::Error),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A single-row lookup matched nothing.
    #[error("no rows in result set")]
    NotFound,

    /// The aggregate destination does not match the aggregate columns.
    #[error("aggregate columns and destination fields should match: {expected} columns, {found} fields")]
    ArityMismatch {
        /// Number of aggregate columns.
        expected: usize,
        /// Number of destination fields.
        found: usize,
    },

    /// A column value could not be converted.
    #[error("cannot decode column '{column}': {message}")]
    Decode {
        /// Column name or position.
        column: String,
        /// What went wrong.
        message: String,
    },

    /// An operation failed and so did the rollback that followed.
    #[error("{source}; rollback error: {rollback}")]
    Rollback {
        /// Error that triggered the rollback.
        source: Box<RepoError>,
        /// Error raised by the rollback.
        rollback: Box<RepoError>,
    },

    /// Committing a successful operation failed.
    #[error("commit error: {source}")]
    Commit {
        /// Error raised by the commit.
        source: Box<RepoError>,
    },
}

impl From<DialectCapabilityError> for RepoError {
    fn from(err: DialectCapabilityError) -> Self {
        Self::Core(err.into())
    }
}

/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_rollback_keeps_both_errors() {
        let err = RepoError::Rollback {
            source: Box::new(RepoError::NotFound),
            rollback: Box::new(RepoError::Database(sqlx::Error::PoolClosed)),
        };
        let message = err.to_string();
        assert!(message.starts_with("no rows in result set; rollback error: "));
        assert!(message.contains("database error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_tx_mismatch_message() {
        let err = RepoError::from(DialectCapabilityError::TxMismatch {
            expected: "postgres",
            found: "sqlite",
        });
        assert_eq!(
            err.to_string(),
            "dialect capability error: expecting tx to be a postgres transaction, got sqlite"
        );
    }
}
