//! Common error types for Prayas services

use thiserror::Error;

/// Common result type for Prayas operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Prayas services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote object store error (upload/delete)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Hosted identity provider rejected or failed a sign-in
    #[error("Identity error: {0}")]
    Identity(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
