//! Mock implementations for testing the session store and service

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::errors::CacheError;
use crate::services::clock::SystemClock;
use crate::services::session::{
    KeyValueStore, SessionConfig, SessionIssuer, SessionService, SessionStore,
};

// Mock key-value store recording the TTL of every write
#[derive(Default)]
pub struct MockKeyValueStore {
    pub entries: Arc<Mutex<HashMap<String, (Vec<u8>, Option<Duration>)>>>,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
    /// Fail only writes whose key contains this fragment
    pub fail_set_matching: Mutex<Option<String>>,
    /// Yield to the scheduler before every operation
    pub yield_ops: AtomicBool,
}

impl MockKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raw(&self, key: &str, value: &[u8]) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_vec(), None));
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).and_then(|(_, ttl)| *ttl)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    async fn maybe_yield(&self) {
        if self.yield_ops.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl KeyValueStore for MockKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.maybe_yield().await;
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(CacheError::Store {
                message: "mock get failure".to_string(),
            });
        }
        Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError> {
        self.maybe_yield().await;
        let matched = self
            .fail_set_matching
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|fragment| key.contains(fragment));
        if matched || self.fail_set.load(Ordering::SeqCst) {
            return Err(CacheError::Store {
                message: "mock set failure".to_string(),
            });
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_vec(), ttl));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        self.maybe_yield().await;
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.lock().unwrap().contains_key(key))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        secret: "test-secret".to_string(),
        issuer: "verifly".to_string(),
        audience: "verifly-api".to_string(),
        access_ttl: chrono::Duration::minutes(15),
        refresh_ttl: chrono::Duration::days(30),
    }
}

pub fn test_issuer() -> SessionIssuer {
    SessionIssuer::new(test_config(), Arc::new(SystemClock)).unwrap()
}

pub fn test_store(kvs: Arc<MockKeyValueStore>) -> SessionStore<MockKeyValueStore> {
    SessionStore::new(kvs, Some("test".to_string()), Arc::new(SystemClock))
}

pub fn test_service(kvs: Arc<MockKeyValueStore>) -> SessionService<MockKeyValueStore> {
    SessionService::new(test_issuer(), test_store(kvs))
}
