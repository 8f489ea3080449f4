//! Business services containing domain logic and use cases.

pub mod auth;
pub mod clock;
pub mod secret;
pub mod session;
pub mod verification;

// Re-export commonly used types
pub use auth::AuthService;
pub use clock::{Clock, ManualClock, SystemClock};
pub use secret::{EntropySource, OsEntropy, SecretGenerator, PIN_LENGTH, TOKEN_BYTES};
pub use session::{
    CacheScalar, JsonMarshaler, KeyValueStore, Marshaler, MemoizeError, ScalarMarshaler,
    SessionConfig, SessionIssuer, SessionService, SessionStore,
};
pub use verification::{
    EmailVerificationService, RequestVerificationResult, VerificationMailer,
    VerificationServiceConfig, VerifyEmailResult,
};
