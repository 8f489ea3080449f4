//! Log-only mailer for development and testing
//!
//! Writes the rendered message to the tracing output instead of sending it.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use vf_core::domain::entities::email_verification::IntentType;
use vf_core::services::verification::VerificationMailer;
use vf_shared::utils::mask_email;

/// Body of the verification email for an intent
pub fn render_pin_message(intent_type: IntentType, pin: &str) -> String {
    let purpose = match intent_type {
        IntentType::SignUp => "finish creating your Verifly account",
        IntentType::ResetPassword => "reset your Verifly password",
    };
    format!("Your verification code is {}. Enter it to {}.", pin, purpose)
}

/// Mailer that logs messages instead of delivering them
#[derive(Clone, Default)]
pub struct LogMailer {
    /// Number of messages "sent"
    message_count: Arc<AtomicU64>,
    /// Fail every send when set
    simulate_failure: Arc<AtomicBool>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of messages sent
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    /// Enable or disable failure simulation
    pub fn set_simulate_failure(&self, simulate: bool) {
        self.simulate_failure.store(simulate, Ordering::SeqCst);
    }
}

#[async_trait]
impl VerificationMailer for LogMailer {
    async fn send_pin(&self, email: &str, intent_type: IntentType, pin: &str) -> Result<(), String> {
        let masked = mask_email(email);

        if self.simulate_failure.load(Ordering::SeqCst) {
            warn!(email = %masked, "Log mailer simulating failure");
            return Err("simulated mail delivery failure".to_string());
        }

        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;
        let body = render_pin_message(intent_type, pin);

        info!(
            target: "mailer",
            provider = "log",
            email = %masked,
            intent = %intent_type,
            message_number = count,
            body = %body,
            "Verification email sent (log only)"
        );

        Ok(())
    }
}
