//! Types for verification service results

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::email_verification::IntentType;

/// Result of requesting a verification
#[derive(Debug, Clone)]
pub struct RequestVerificationResult {
    pub verification_id: Uuid,
    /// Request token the client presents together with the mailed PIN
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Whether an existing pending verification was reused
    pub reused: bool,
}

/// Result of a successful verification
#[derive(Debug, Clone)]
pub struct VerifyEmailResult {
    pub verification_id: Uuid,
    pub email: String,
    pub intent_type: IntentType,
    /// Bearer credential for the follow-up step
    pub verified_token: String,
}
