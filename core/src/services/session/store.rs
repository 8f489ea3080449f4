//! Cache-aside store and session table over a [`KeyValueStore`]

use sha2::{Digest, Sha256};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::session::Session;
use crate::errors::CacheError;
use crate::services::clock::Clock;

use super::codec::{CacheScalar, Marshaler};
use super::traits::KeyValueStore;

const ACCESS_KEY_SPACE: &str = "session:access";
const REFRESH_KEY_SPACE: &str = "session:refresh";

/// Failure of [`SessionStore::memoize`]
///
/// `Marshal` and `Store` mean the computation succeeded but its result could
/// not be cached; the value is carried so the caller can still use it.
#[derive(Debug)]
pub enum MemoizeError<T, E> {
    /// The computation itself failed
    Compute(E),
    /// Reading or decoding the cached value failed
    Lookup(CacheError),
    /// The computed value could not be encoded
    Marshal { value: T, source: CacheError },
    /// The computed value could not be written
    Store { value: T, source: CacheError },
}

impl<T, E> MemoizeError<T, E> {
    /// The computed value, when the failure happened after computing it
    pub fn into_value(self) -> Option<T> {
        match self {
            MemoizeError::Marshal { value, .. } | MemoizeError::Store { value, .. } => Some(value),
            MemoizeError::Compute(_) | MemoizeError::Lookup(_) => None,
        }
    }
}

impl<T, E: fmt::Display> fmt::Display for MemoizeError<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoizeError::Compute(e) => write!(f, "computation failed: {}", e),
            MemoizeError::Lookup(e) => write!(f, "cache lookup failed: {}", e),
            MemoizeError::Marshal { source, .. } => write!(f, "cache marshal failed: {}", source),
            MemoizeError::Store { source, .. } => write!(f, "cache store failed: {}", source),
        }
    }
}

impl<T: fmt::Debug, E: std::error::Error + 'static> std::error::Error for MemoizeError<T, E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MemoizeError::Compute(e) => Some(e),
            MemoizeError::Lookup(e) => Some(e),
            MemoizeError::Marshal { source, .. } | MemoizeError::Store { source, .. } => {
                Some(source)
            }
        }
    }
}

/// TTL-keyed store used for memoization and as the session table
pub struct SessionStore<K: KeyValueStore + ?Sized> {
    kvs: Arc<K>,
    key_prefix: Option<String>,
    clock: Arc<dyn Clock>,
}

impl<K: KeyValueStore + ?Sized> Clone for SessionStore<K> {
    fn clone(&self) -> Self {
        Self {
            kvs: Arc::clone(&self.kvs),
            key_prefix: self.key_prefix.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<K: KeyValueStore + ?Sized> SessionStore<K> {
    pub fn new(kvs: Arc<K>, key_prefix: Option<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            kvs,
            key_prefix,
            clock,
        }
    }

    fn make_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    /// Read a scalar value
    pub async fn get<T: CacheScalar>(&self, key: &str) -> Result<T, CacheError> {
        let full_key = self.make_key(key);
        let bytes = self
            .kvs
            .get(&full_key)
            .await?
            .ok_or_else(|| CacheError::KeyNotFound {
                key: full_key.clone(),
            })?;

        T::decode(&bytes).map_err(|message| CacheError::Decode {
            key: full_key,
            message,
        })
    }

    /// Return the cached value at `key`, computing and caching it on a miss
    ///
    /// `compute` is not called on a hit. A cached value that fails to decode
    /// is reported as `Lookup` rather than silently recomputed.
    pub async fn memoize<T, E, F, Fut, Mz>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
        marshaler: &Mz,
    ) -> Result<T, MemoizeError<T, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Mz: Marshaler<T> + ?Sized,
    {
        let full_key = self.make_key(key);

        let cached = self.kvs.get(&full_key).await.map_err(MemoizeError::Lookup)?;
        if let Some(bytes) = cached {
            tracing::debug!(key = %full_key, "Cache hit");
            return marshaler.unmarshal(&bytes).map_err(|message| {
                MemoizeError::Lookup(CacheError::Decode {
                    key: full_key.clone(),
                    message,
                })
            });
        }

        tracing::debug!(key = %full_key, "Cache miss, computing");
        let value = compute().await.map_err(MemoizeError::Compute)?;

        let bytes = match marshaler.marshal(&value) {
            Ok(bytes) => bytes,
            Err(message) => {
                return Err(MemoizeError::Marshal {
                    value,
                    source: CacheError::Marshal {
                        key: full_key,
                        message,
                    },
                })
            }
        };

        if let Err(source) = self.set_raw(&full_key, &bytes, ttl).await {
            tracing::warn!(key = %full_key, error = %source, "Failed to store memoized value");
            return Err(MemoizeError::Store { value, source });
        }

        Ok(value)
    }

    /// Write a scalar value
    pub async fn set<T: CacheScalar>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.set_raw(&self.make_key(key), &value.encode(), ttl).await
    }

    pub async fn del(&self, key: &str) -> Result<bool, CacheError> {
        self.kvs.del(&self.make_key(key)).await
    }

    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.kvs.exists(&self.make_key(key)).await
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        self.kvs.ping().await
    }

    /// Store a session under both of its tokens
    ///
    /// Each entry lives exactly as long as the token it is keyed by.
    pub async fn create(&self, session: &Session) -> Result<(), CacheError> {
        let now = self.clock.now();
        let bytes = serde_json::to_vec(session).map_err(|e| CacheError::Marshal {
            key: ACCESS_KEY_SPACE.to_string(),
            message: e.to_string(),
        })?;

        let access_key = self.access_key(&session.tokens.access.value);
        let access_ttl = session
            .tokens
            .access
            .remaining(now)
            .ok_or_else(|| CacheError::InvalidTtl {
                key: access_key.clone(),
            })?;

        let refresh_key = self.refresh_key(&session.tokens.refresh.value);
        let refresh_ttl = session
            .tokens
            .refresh
            .remaining(now)
            .ok_or_else(|| CacheError::InvalidTtl {
                key: refresh_key.clone(),
            })?;

        self.set_raw(&access_key, &bytes, Some(access_ttl)).await?;
        if let Err(e) = self.set_raw(&refresh_key, &bytes, Some(refresh_ttl)).await {
            if let Err(cleanup) = self.kvs.del(&access_key).await {
                tracing::warn!(error = %cleanup, "Failed to remove orphaned access entry");
            }
            return Err(e);
        }

        tracing::debug!(user_id = %session.user_id, "Session stored");
        Ok(())
    }

    /// Resolve a session by its access token
    pub async fn lookup(&self, access_token: &str) -> Result<Option<Session>, CacheError> {
        self.load(&self.access_key(access_token)).await
    }

    /// Resolve a session by its refresh token
    pub async fn lookup_refresh(&self, refresh_token: &str) -> Result<Option<Session>, CacheError> {
        self.load(&self.refresh_key(refresh_token)).await
    }

    /// Atomically take ownership of a refresh token
    ///
    /// Returns `true` for exactly one caller; every other caller racing on
    /// the same token sees `false`.
    pub async fn claim_refresh(&self, refresh_token: &str) -> Result<bool, CacheError> {
        self.kvs.del(&self.refresh_key(refresh_token)).await
    }

    /// Remove both entries of a session
    pub async fn invalidate(&self, session: &Session) -> Result<(), CacheError> {
        self.kvs
            .del(&self.access_key(&session.tokens.access.value))
            .await?;
        self.kvs
            .del(&self.refresh_key(&session.tokens.refresh.value))
            .await?;

        tracing::debug!(user_id = %session.user_id, "Session invalidated");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Session>, CacheError> {
        match self.kvs.get(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::Decode {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn set_raw(
        &self,
        full_key: &str,
        bytes: &[u8],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        if ttl.is_some_and(|t| t.is_zero()) {
            return Err(CacheError::InvalidTtl {
                key: full_key.to_string(),
            });
        }
        self.kvs.set(full_key, bytes, ttl).await
    }

    fn access_key(&self, token: &str) -> String {
        self.make_key(&format!("{}:{}", ACCESS_KEY_SPACE, token_digest(token)))
    }

    fn refresh_key(&self, token: &str) -> String {
        self.make_key(&format!("{}:{}", REFRESH_KEY_SPACE, token_digest(token)))
    }
}

/// Tokens are never stored as keys in the clear
fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
