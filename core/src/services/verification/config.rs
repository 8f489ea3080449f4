//! Configuration for the verification service

use chrono::Duration;
use vf_shared::config::VerificationConfig;

/// Configuration for the verification service
#[derive(Debug, Clone)]
pub struct VerificationServiceConfig {
    /// How long a requested PIN stays valid
    pub expires_in: Duration,
}

impl Default for VerificationServiceConfig {
    fn default() -> Self {
        Self::from(&VerificationConfig::default())
    }
}

impl From<&VerificationConfig> for VerificationServiceConfig {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            expires_in: Duration::seconds(config.expires_in_seconds),
        }
    }
}
