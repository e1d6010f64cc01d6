//! Error types for the token core.

mod types;

pub use types::{KeyError, RefreshError, TokenError};

use thiserror::Error;

/// Top-level error for the token core.
///
/// Domain-specific failures keep their own enums and are bridged in
/// transparently so callers can match on the precise kind; the plain
/// variants cover storage and invariant failures that have no richer home.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

impl CoreError {
    /// Stable machine-readable code for API consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::Validation { .. } => "VALIDATION_ERROR",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::Storage { .. } => "STORAGE_ERROR",
            CoreError::Internal { .. } => "INTERNAL_ERROR",
            CoreError::Key(e) => e.error_code(),
            CoreError::Token(e) => e.error_code(),
            CoreError::Refresh(e) => e.error_code(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
