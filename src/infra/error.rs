//! Error types for the persistence layer.

use thiserror::Error;

/// Errors surfaced by the store implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// User not found
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
