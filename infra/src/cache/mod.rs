//! Key-value store backends
//!
//! Both backends implement [`KeyValueStore`](vf_core::services::session::KeyValueStore):
//! Redis for deployments, an in-process map for development and tests.

pub mod memory_store;
pub mod redis_client;


pub use memory_store::MemoryStore;
pub use redis_client::RedisClient;

// Re-export commonly used types
pub use vf_shared::config::CacheConfig;
