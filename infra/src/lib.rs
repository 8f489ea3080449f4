//! # Infrastructure Layer
//!
//! Concrete implementations of the ports defined in `vf_core`:
//!
//! - **Database**: MySQL verification repository using SQLx
//! - **Cache**: Redis and in-process [`KeyValueStore`](vf_core::services::session::KeyValueStore) backends
//! - **Email**: PIN delivery (log-only mailer for development)
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis support (default)

// Re-export core types for convenience
pub use vf_core::errors::*;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Cache module - Redis client and in-process store
pub mod cache;

/// Email module - verification PIN delivery
pub mod email;

/// Configuration types consumed by the infrastructure layer
pub mod config {
    pub use vf_shared::config::{CacheConfig, CacheType, DatabaseConfig};
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mail delivery error
    #[error("Mail delivery error: {0}")]
    Mail(String),
}

impl From<InfrastructureError> for CacheError {
    fn from(err: InfrastructureError) -> Self {
        CacheError::Store {
            message: err.to_string(),
        }
    }
}
