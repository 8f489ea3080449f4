//! Session token issuer

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::session::{Claims, Session, SessionToken, SessionTokens, TokenUse};
use crate::errors::SessionError;
use crate::services::clock::Clock;

use super::config::SessionConfig;

/// Mints HS256-signed access/refresh token pairs
pub struct SessionIssuer {
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionIssuer {
    /// Creates a new issuer
    ///
    /// Fails when the secret is empty or a lifetime is not positive.
    pub fn new(config: SessionConfig, clock: Arc<dyn Clock>) -> Result<Self, SessionError> {
        if config.secret.is_empty() {
            return Err(SessionError::SigningFailed(
                "signing secret must not be empty".to_string(),
            ));
        }
        if config.access_ttl <= chrono::Duration::zero()
            || config.refresh_ttl <= chrono::Duration::zero()
        {
            return Err(SessionError::SigningFailed(
                "token lifetimes must be positive".to_string(),
            ));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        // Time claims are checked against the injected clock in `decode`
        validation.validate_exp = false;
        validation.validate_nbf = false;

        Ok(Self {
            config,
            clock,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    /// Issues a fresh session for `user_id`
    pub fn new_session(&self, user_id: Uuid) -> Result<Session, SessionError> {
        let access = self.sign(user_id, TokenUse::Access, self.config.access_ttl)?;
        let refresh = self.sign(user_id, TokenUse::Refresh, self.config.refresh_ttl)?;

        Ok(Session {
            user_id,
            tokens: SessionTokens { access, refresh },
        })
    }

    /// Issues a session or panics
    ///
    /// For fixtures and seed code only; request paths use [`new_session`](Self::new_session).
    pub fn must_new_session(&self, user_id: Uuid) -> Session {
        match self.new_session(user_id) {
            Ok(session) => session,
            Err(e) => panic!("failed to issue session for {}: {}", user_id, e),
        }
    }

    /// Validates signature, issuer, audience and expiry and returns the claims
    pub fn decode(&self, token: &str) -> Result<Claims, SessionError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::TokenExpired,
                _ => SessionError::InvalidToken,
            })?;

        let now = self.clock.now().timestamp();
        if claims.nbf > now {
            return Err(SessionError::InvalidToken);
        }
        if claims.exp <= now {
            return Err(SessionError::TokenExpired);
        }
        Ok(claims)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn sign(
        &self,
        user_id: Uuid,
        token_use: TokenUse,
        lifetime: chrono::Duration,
    ) -> Result<SessionToken, SessionError> {
        let now = self.clock.now();
        let claims = Claims::new(
            user_id,
            token_use,
            now,
            lifetime,
            &self.config.issuer,
            &self.config.audience,
        );

        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::SigningFailed(e.to_string()))?;

        Ok(SessionToken {
            value,
            expires_at: now + lifetime,
        })
    }
}
