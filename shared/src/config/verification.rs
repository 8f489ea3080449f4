//! Email verification flow configuration

use serde::{Deserialize, Serialize};

use super::env_parse;

/// Settings for the email verification flow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// How long a requested PIN/token pair stays valid, in seconds
    #[serde(default = "default_expires_in_seconds")]
    pub expires_in_seconds: i64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            expires_in_seconds: default_expires_in_seconds(),
        }
    }
}

impl VerificationConfig {
    /// Apply environment overrides on top of this configuration
    pub fn merge_env(mut self) -> Self {
        if let Some(seconds) = env_parse("VERIFICATION_EXPIRES_IN_SECONDS") {
            self.expires_in_seconds = seconds;
        }
        self
    }
}

fn default_expires_in_seconds() -> i64 {
    3600 // 1 hour
}
