//! Authentication service module
//!
//! Ties email verification to session issuance:
//! - Completing a verified email flow into a session
//! - Direct sign-in for identities proven elsewhere (OAuth callbacks)
//! - Session authentication, rotation and sign-out

mod service;


pub use service::AuthService;
