//! Main authentication service implementation

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::entities::email_verification::EmailVerification;
use crate::domain::entities::session::Session;
use crate::errors::DomainResult;
use crate::repositories::EmailVerificationRepository;
use crate::services::session::{KeyValueStore, SessionService};
use crate::services::verification::{EmailVerificationService, VerificationMailer};

/// Authentication service for the verification-to-session flow
pub struct AuthService<R, M, K>
where
    R: EmailVerificationRepository + ?Sized,
    M: VerificationMailer + ?Sized,
    K: KeyValueStore + ?Sized,
{
    /// Verification service for email PIN handling
    verification_service: Arc<EmailVerificationService<R, M>>,
    /// Session service for token issuance and lookup
    session_service: Arc<SessionService<K>>,
}

impl<R, M, K> AuthService<R, M, K>
where
    R: EmailVerificationRepository + ?Sized,
    M: VerificationMailer + ?Sized,
    K: KeyValueStore + ?Sized,
{
    pub fn new(
        verification_service: Arc<EmailVerificationService<R, M>>,
        session_service: Arc<SessionService<K>>,
    ) -> Self {
        Self {
            verification_service,
            session_service,
        }
    }

    pub fn verification(&self) -> &EmailVerificationService<R, M> {
        &self.verification_service
    }

    pub fn sessions(&self) -> &SessionService<K> {
        &self.session_service
    }

    /// Consume a verified token and start a session for `user_id`
    pub async fn complete_verification(
        &self,
        ctx: &CancellationToken,
        verified_token: &str,
        user_id: Uuid,
    ) -> DomainResult<Session> {
        let verification = self.verification_service.consume(ctx, verified_token).await?;
        self.start_for(ctx, &verification, user_id).await
    }

    /// Consume a verified token and start a session for the account bound to
    /// the verified email
    pub async fn complete_email_verification(
        &self,
        ctx: &CancellationToken,
        verified_token: &str,
    ) -> DomainResult<Session> {
        let verification = self.verification_service.consume(ctx, verified_token).await?;
        self.start_for(ctx, &verification, verification.account_id()).await
    }

    async fn start_for(
        &self,
        ctx: &CancellationToken,
        verification: &EmailVerification,
        user_id: Uuid,
    ) -> DomainResult<Session> {
        let session = self.session_service.start(ctx, user_id).await?;

        tracing::info!(
            verification_id = %verification.id(),
            user_id = %user_id,
            intent = %verification.intent_type(),
            "Verification completed"
        );
        Ok(session)
    }

    /// Start a session for an identity already proven by an external provider
    pub async fn sign_in(&self, ctx: &CancellationToken, user_id: Uuid) -> DomainResult<Session> {
        self.session_service.start(ctx, user_id).await
    }

    pub async fn authenticate(&self, access_token: &str) -> DomainResult<Session> {
        self.session_service.authenticate(access_token).await
    }

    pub async fn refresh(&self, ctx: &CancellationToken, refresh_token: &str) -> DomainResult<Session> {
        self.session_service.refresh(ctx, refresh_token).await
    }

    pub async fn sign_out(&self, access_token: &str) -> DomainResult<()> {
        self.session_service.sign_out(access_token).await
    }
}
