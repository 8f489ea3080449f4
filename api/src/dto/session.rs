use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use vf_core::domain::entities::session::Session;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSessionRequest {
    /// Token returned by a successful verification
    #[validate(length(min = 1, max = 128))]
    pub verified_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshSessionRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub token_type: String,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user_id: session.user_id,
            access_token: session.tokens.access.value,
            access_token_expires_at: session.tokens.access.expires_at,
            refresh_token: session.tokens.refresh.value,
            refresh_token_expires_at: session.tokens.refresh.expires_at,
            token_type: "Bearer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentSessionResponse {
    pub user_id: Uuid,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<&Session> for CurrentSessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id,
            access_token_expires_at: session.tokens.access.expires_at,
            refresh_token_expires_at: session.tokens.refresh.expires_at,
        }
    }
}
