//! Main verification service implementation

use constant_time_eq::constant_time_eq;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use vf_shared::utils::validation::{is_valid_email, mask_email, normalize_email};

use crate::domain::entities::email_verification::{
    EmailVerification, IntentType, VerificationState,
};
use crate::errors::{DomainError, DomainResult, ValidationError, VerificationError};
use crate::repositories::EmailVerificationRepository;
use crate::services::clock::Clock;
use crate::services::secret::SecretGenerator;

use super::config::VerificationServiceConfig;
use super::traits::VerificationMailer;
use super::types::{RequestVerificationResult, VerifyEmailResult};

/// Service orchestrating the email verification lifecycle
pub struct EmailVerificationService<R, M>
where
    R: EmailVerificationRepository + ?Sized,
    M: VerificationMailer + ?Sized,
{
    repository: Arc<R>,
    mailer: Arc<M>,
    secrets: SecretGenerator,
    clock: Arc<dyn Clock>,
    config: VerificationServiceConfig,
}

impl<R, M> EmailVerificationService<R, M>
where
    R: EmailVerificationRepository + ?Sized,
    M: VerificationMailer + ?Sized,
{
    pub fn new(
        repository: Arc<R>,
        mailer: Arc<M>,
        secrets: SecretGenerator,
        clock: Arc<dyn Clock>,
        config: VerificationServiceConfig,
    ) -> Self {
        Self {
            repository,
            mailer,
            secrets,
            clock,
            config,
        }
    }

    /// Request a verification for `email` and mail its PIN
    ///
    /// A pending, unexpired verification for the same email and intent is
    /// reused: its PIN is mailed again and its expiry is left unchanged.
    pub async fn request_verification(
        &self,
        ctx: &CancellationToken,
        email: &str,
        intent_type: IntentType,
    ) -> DomainResult<RequestVerificationResult> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail.into());
        }

        let now = self.clock.now();
        let pending = self
            .repository
            .find_pending(&email, intent_type)
            .await?
            .filter(|v| v.is_pending_at(now));

        let (verification, reused) = match pending {
            Some(mut existing) => {
                existing.request(self.config.expires_in, self.clock.as_ref(), &self.secrets)?;
                (existing, true)
            }
            None => {
                if ctx.is_cancelled() {
                    return Err(DomainError::Cancelled);
                }
                let mut fresh = EmailVerification::new(email.clone(), intent_type, self.clock.as_ref());
                fresh.request(self.config.expires_in, self.clock.as_ref(), &self.secrets)?;

                if ctx.is_cancelled() {
                    return Err(DomainError::Cancelled);
                }
                self.repository.save(&fresh).await?;
                (fresh, false)
            }
        };

        let requested = verification
            .requested()
            .ok_or(VerificationError::NotRequested)?;

        if ctx.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        self.mailer
            .send_pin(&email, intent_type, &requested.pin_code)
            .await
            .map_err(|e| DomainError::internal("failed to send verification email", e))?;

        tracing::info!(
            verification_id = %verification.id(),
            email = %mask_email(&email),
            intent = %intent_type,
            reused,
            "Verification requested"
        );

        Ok(RequestVerificationResult {
            verification_id: verification.id(),
            token: requested.token.clone(),
            expires_at: requested.expires_at,
            reused,
        })
    }

    /// Verify a request token and PIN
    ///
    /// Unknown tokens and wrong PINs are indistinguishable to the caller.
    pub async fn verify_email(
        &self,
        ctx: &CancellationToken,
        token: &str,
        pin: &str,
    ) -> DomainResult<VerifyEmailResult> {
        let mut verification = self
            .repository
            .find_by_request_token(token)
            .await?
            .ok_or(VerificationError::InvalidCode)?;

        let pin_matches = verification
            .requested()
            .is_some_and(|r| constant_time_eq(r.pin_code.as_bytes(), pin.as_bytes()));
        if !pin_matches {
            tracing::warn!(verification_id = %verification.id(), "Verification PIN mismatch");
            return Err(VerificationError::InvalidCode.into());
        }

        if ctx.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let was_verified = verification.state() != VerificationState::Requested;
        verification.verify(self.clock.as_ref(), &self.secrets)?;

        if !was_verified {
            if ctx.is_cancelled() {
                return Err(DomainError::Cancelled);
            }
            let saved = self.repository.save(&verification).await;
            match saved {
                Ok(()) => {
                    tracing::info!(verification_id = %verification.id(), "Email verified");
                }
                Err(DomainError::Verification(VerificationError::AlreadyVerified)) => {
                    // A concurrent verify stored its token first; hand out that one
                    verification = self
                        .repository
                        .find_by_request_token(token)
                        .await?
                        .ok_or(VerificationError::InvalidCode)?;
                    if verification.state() == VerificationState::Consumed {
                        return Err(VerificationError::AlreadyConsumed.into());
                    }
                }
                Err(e) => return Err(e),
            }
        }

        let verified_token = verification
            .verified()
            .map(|v| v.token.clone())
            .ok_or(VerificationError::NotVerified)?;

        Ok(VerifyEmailResult {
            verification_id: verification.id(),
            email: verification.email().to_string(),
            intent_type: verification.intent_type(),
            verified_token,
        })
    }

    /// Resolve a verified, not yet consumed verification by its verified token
    pub async fn find_verified(&self, verified_token: &str) -> DomainResult<EmailVerification> {
        let verification = self
            .repository
            .find_by_verified_token(verified_token)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                resource: "verification".to_string(),
            })?;

        match verification.state() {
            VerificationState::Verified => Ok(verification),
            VerificationState::Consumed => Err(VerificationError::AlreadyConsumed.into()),
            _ => Err(VerificationError::NotVerified.into()),
        }
    }

    /// Consume a verified token
    ///
    /// The verified token is single-use: presenting it again after it was
    /// consumed fails with `AlreadyConsumed`, including when two callers
    /// race on it.
    pub async fn consume(
        &self,
        ctx: &CancellationToken,
        verified_token: &str,
    ) -> DomainResult<EmailVerification> {
        let mut verification = self.find_verified(verified_token).await?;
        verification.consume(self.clock.as_ref())?;

        if ctx.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        self.repository.save(&verification).await?;

        tracing::info!(
            verification_id = %verification.id(),
            intent = %verification.intent_type(),
            "Verification consumed"
        );
        Ok(verification)
    }
}
