//! Request and response bodies

pub mod session;
pub mod verification;

pub use session::{
    CreateSessionRequest, CurrentSessionResponse, RefreshSessionRequest, SessionResponse,
};
pub use verification::{
    RequestVerificationRequest, RequestVerificationResponse, VerifyEmailRequest,
    VerifyEmailResponse,
};
