//! Cryptographically secure secret generation
//!
//! Produces the numeric PINs mailed to users and the opaque hex tokens used
//! as bearer credentials. All randomness comes from an [`EntropySource`],
//! which is the operating system CSPRNG outside of tests.

use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;

use crate::errors::SecretError;

/// Number of digits in a verification PIN
pub const PIN_LENGTH: usize = 6;

/// Number of random bytes in an opaque token (hex-encoded to twice as many chars)
pub const TOKEN_BYTES: usize = 32;

/// Bytes at or above this bound are rejected so `byte % 10` is uniform
const DIGIT_REJECTION_BOUND: u8 = 250;

/// Source of cryptographically secure random bytes
pub trait EntropySource: Send + Sync {
    /// Fills `dest` entirely with random bytes
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), SecretError>;
}

/// Operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), SecretError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| SecretError::Entropy(e.to_string()))
    }
}

/// Generator for PINs and opaque tokens
#[derive(Clone)]
pub struct SecretGenerator {
    source: Arc<dyn EntropySource>,
}

impl SecretGenerator {
    /// Creates a generator over the given entropy source
    pub fn new(source: Arc<dyn EntropySource>) -> Self {
        Self { source }
    }

    /// Creates a generator backed by the operating system CSPRNG
    pub fn os() -> Self {
        Self::new(Arc::new(OsEntropy))
    }

    /// Generates a numeric PIN of exactly `length` ASCII digits
    ///
    /// Leading zeros are kept. Entropy failures are returned, never retried.
    pub fn new_pin(&self, length: usize) -> Result<String, SecretError> {
        if length == 0 {
            return Err(SecretError::InvalidLength);
        }

        let mut pin = String::with_capacity(length);
        let mut buf = vec![0u8; length];
        while pin.len() < length {
            self.source.try_fill(&mut buf)?;
            for byte in buf.iter().copied() {
                if pin.len() == length {
                    break;
                }
                if byte < DIGIT_REJECTION_BOUND {
                    pin.push(char::from(b'0' + byte % 10));
                }
            }
        }
        Ok(pin)
    }

    /// Generates an opaque token from `bytes` random bytes, lowercase hex encoded
    pub fn new_token(&self, bytes: usize) -> Result<String, SecretError> {
        if bytes == 0 {
            return Err(SecretError::InvalidLength);
        }

        let mut buf = vec![0u8; bytes];
        self.source.try_fill(&mut buf)?;
        Ok(hex::encode(buf))
    }
}

impl Default for SecretGenerator {
    fn default() -> Self {
        Self::os()
    }
}

impl std::fmt::Debug for SecretGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretGenerator").finish_non_exhaustive()
    }
}
