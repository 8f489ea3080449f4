//! Error kinds for the verification aggregate, secret generation,
//! session issuance and the key-value session store.
//!
//! Each enum is closed so callers match exhaustively. Messages are stable
//! English strings; the presentation layer maps kinds to error codes.

use thiserror::Error;

/// Email verification state machine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Verification already consumed")]
    AlreadyConsumed,

    #[error("Verification already verified")]
    AlreadyVerified,

    #[error("Verification not requested")]
    NotRequested,

    #[error("Verification not verified")]
    NotVerified,

    #[error("Verification token expired")]
    TokenExpired,

    #[error("Verification expiry must be a positive duration")]
    InvalidExpiry,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("Corrupted verification record: {reason}")]
    Corrupted { reason: String },

    #[error("Secret generation failed: {0}")]
    SecretGeneration(#[from] SecretError),
}

/// Secret generation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("Secret length must be greater than zero")]
    InvalidLength,

    #[error("Entropy source failure: {0}")]
    Entropy(String),
}

/// Session issuance and lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session token signing failed: {0}")]
    SigningFailed(String),

    #[error("Invalid session token")]
    InvalidToken,

    #[error("Session token expired")]
    TokenExpired,

    #[error("Session token used for the wrong purpose")]
    WrongTokenUse,

    #[error("Session not found")]
    SessionNotFound,
}

/// Key-value store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Failed to decode value for key {key}: {message}")]
    Decode { key: String, message: String },

    #[error("Failed to marshal value for key {key}: {message}")]
    Marshal { key: String, message: String },

    #[error("Invalid TTL for key {key}")]
    InvalidTtl { key: String },

    #[error("Store failure: {message}")]
    Store { message: String },
}

/// Input validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid intent type: {0}")]
    InvalidIntent(String),

    #[error("Required field missing: {field}")]
    RequiredField { field: String },
}
