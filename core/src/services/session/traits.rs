//! Key-value backend abstraction

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::CacheError;

/// Single-value key-value store with optional per-key TTL
///
/// Implemented by the Redis client and the in-process store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the raw value stored at `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` at `key`; `None` keeps it until deleted
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Delete `key`, returning whether it existed
    async fn del(&self, key: &str) -> Result<bool, CacheError>;

    /// Check whether `key` exists
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<(), CacheError>;
}
