//! Domain-specific error types and error handling.

mod types;

#[cfg(test)]
mod tests;

pub use types::{CacheError, SecretError, SessionError, ValidationError, VerificationError};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    ValidationErr(#[from] ValidationError),
}

impl DomainError {
    /// Wrap a collaborator failure (repository, mailer) with context
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        DomainError::Internal {
            message: format!("{}: {}", context, err),
        }
    }

    /// Whether this error is an opaque internal failure rather than a
    /// condition the caller can act on
    pub fn is_internal(&self) -> bool {
        match self {
            DomainError::Internal { .. } | DomainError::Secret(_) => true,
            DomainError::Verification(VerificationError::Corrupted { .. })
            | DomainError::Verification(VerificationError::SecretGeneration(_)) => true,
            DomainError::Session(SessionError::SigningFailed(_)) => true,
            DomainError::Cache(CacheError::KeyNotFound { .. }) => false,
            DomainError::Cache(_) => true,
            _ => false,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
