use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use vf_core::domain::entities::email_verification::IntentType;
use vf_core::services::verification::{RequestVerificationResult, VerifyEmailResult};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RequestVerificationRequest {
    /// Address the PIN is mailed to
    #[validate(email, length(max = 254))]
    pub email: String,

    /// "sign_up" or "reset_password"
    pub intent_type: IntentType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestVerificationResponse {
    pub verification_id: Uuid,
    /// Opaque handle to send back with the PIN
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<RequestVerificationResult> for RequestVerificationResponse {
    fn from(result: RequestVerificationResult) -> Self {
        Self {
            verification_id: result.verification_id,
            token: result.token,
            expires_at: result.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, max = 128))]
    pub token: String,

    /// 6-digit PIN from the email
    #[validate(length(equal = 6))]
    pub pin_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailResponse {
    pub verification_id: Uuid,
    pub email: String,
    pub intent_type: IntentType,
    /// Single-use credential for the follow-up step
    pub verified_token: String,
}

impl From<VerifyEmailResult> for VerifyEmailResponse {
    fn from(result: VerifyEmailResult) -> Self {
        Self {
            verification_id: result.verification_id,
            email: result.email,
            intent_type: result.intent_type,
            verified_token: result.verified_token,
        }
    }
}
