//! Error types for the idempotency ledger

use thiserror::Error;

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Database operation failed (connection, query execution, etc.)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Key validation failed (empty, too long)
    #[error("Invalid idempotency key: {0}")]
    InvalidKey(String),

    /// The key was already claimed for a different resource
    #[error("Idempotency key {key} belongs to {existing}, not {requested}")]
    ScopeMismatch {
        key: String,
        existing: String,
        requested: String,
    },
}

impl LedgerError {
    /// Caller-side mistakes, as opposed to storage failures
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidKey(_) | LedgerError::ScopeMismatch { .. }
        )
    }

    /// Check if error is transient (should retry)
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::Database(sqlx_err) => {
                matches!(sqlx_err, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_))
            }
            _ => false,
        }
    }
}
