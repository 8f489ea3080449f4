//! Email verification use cases
//!
//! This module drives the verification aggregate against a repository:
//! - Requesting a verification and mailing the PIN
//! - Verifying a request token and PIN
//! - Consuming a verified token exactly once

mod config;
mod service;
mod traits;
mod types;


pub use config::VerificationServiceConfig;
pub use service::EmailVerificationService;
pub use traits::VerificationMailer;
pub use types::{RequestVerificationResult, VerifyEmailResult};
