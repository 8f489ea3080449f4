//! # Verifly Core
//!
//! Core business logic for the Verifly backend.
//! This crate contains the email verification aggregate, secret generation,
//! session issuance, the cache-aside session store, repository interfaces
//! and the error types the outer layers map to responses.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
