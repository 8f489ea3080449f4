//! MySQL implementations of the core repository traits

pub mod email_verification_repository_impl;

pub use email_verification_repository_impl::MySqlEmailVerificationRepository;
