//! Session issuance and storage
//!
//! This module provides:
//! - Signed access/refresh token pairs bound to a user
//! - A cache-aside store over a pluggable key-value backend
//! - The session table (create, lookup, rotate, invalidate)

mod codec;
mod config;
mod issuer;
mod service;
mod store;
mod traits;

#[cfg(test)]
pub(crate) mod tests;

pub use codec::{CacheScalar, JsonMarshaler, Marshaler, ScalarMarshaler};
pub use config::SessionConfig;
pub use issuer::SessionIssuer;
pub use service::SessionService;
pub use store::{MemoizeError, SessionStore};
pub use traits::KeyValueStore;
