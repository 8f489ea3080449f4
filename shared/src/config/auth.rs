//! Authentication and session configuration

use serde::{Deserialize, Serialize};

use super::env_parse;

const DEFAULT_SECRET: &str = "your-secret-key-change-in-production";

/// JWT signing configuration for session tokens
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Secret key for HS256 signing
    pub secret: String,

    /// Access token lifetime in seconds
    pub access_token_expiry: i64,

    /// Refresh token lifetime in seconds
    pub refresh_token_expiry: i64,

    /// JWT issuer claim
    pub issuer: String,

    /// JWT audience claim
    #[serde(default = "default_audience")]
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            access_token_expiry: 900,     // 15 minutes
            refresh_token_expiry: 2_592_000, // 30 days
            issuer: String::from("verifly"),
            audience: default_audience(),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry = minutes * 60;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry = days * 86400;
        self
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
}

impl AuthConfig {
    /// Create an authentication configuration from a JWT configuration
    pub fn new(jwt: JwtConfig) -> Self {
        Self { jwt }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_env_with(Self::default())
    }

    /// Apply environment overrides on top of an existing configuration
    pub fn from_env_with(mut base: Self) -> Self {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            base.jwt.secret = secret;
        }
        if let Some(expiry) = env_parse("JWT_ACCESS_TOKEN_EXPIRY") {
            base.jwt.access_token_expiry = expiry;
        }
        if let Some(expiry) = env_parse("JWT_REFRESH_TOKEN_EXPIRY") {
            base.jwt.refresh_token_expiry = expiry;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            base.jwt.issuer = issuer;
        }
        if let Ok(audience) = std::env::var("JWT_AUDIENCE") {
            base.jwt.audience = audience;
        }
        base
    }

    /// Get JWT secret
    pub fn jwt_secret(&self) -> &str {
        &self.jwt.secret
    }
}

fn default_audience() -> String {
    String::from("verifly-api")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_config_defaults() {
        let config = JwtConfig::default();
        assert_eq!(config.access_token_expiry, 900);
        assert_eq!(config.issuer, "verifly");
        assert!(config.is_using_default_secret());
    }

    #[test]
    fn test_jwt_config_builders() {
        let config = JwtConfig::new("s3cret")
            .with_access_expiry_minutes(5)
            .with_refresh_expiry_days(1);
        assert_eq!(config.access_token_expiry, 300);
        assert_eq!(config.refresh_token_expiry, 86400);
        assert!(!config.is_using_default_secret());
    }
}
