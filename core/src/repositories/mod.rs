pub mod email_verification;

pub use email_verification::{EmailVerificationRepository, InMemoryEmailVerificationRepository};
