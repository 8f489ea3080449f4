//! Domain entities representing core business objects.

pub mod email_verification;
pub mod session;


// Re-export commonly used types
pub use email_verification::{
    account_id, Consumed, EmailVerification, IntentType, Requested, VerificationState, Verified,
};
pub use session::{Claims, Session, SessionToken, SessionTokens, TokenUse};
