//! Traits for out-of-band PIN delivery

use async_trait::async_trait;

use crate::domain::entities::email_verification::IntentType;

/// Trait for verification email delivery
#[async_trait]
pub trait VerificationMailer: Send + Sync {
    /// Send the PIN for a verification to `email`
    async fn send_pin(&self, email: &str, intent_type: IntentType, pin: &str) -> Result<(), String>;
}
