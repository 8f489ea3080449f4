//! Email verification repository trait defining the persistence contract.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::email_verification::{EmailVerification, IntentType};
use crate::errors::DomainError;

/// Repository trait for EmailVerification aggregate persistence
///
/// Storage is append-only per stage: the parent row is written once and each
/// sub-record (requested, verified, consumed) is inserted the first time it
/// is present. Rows are never updated or deleted by the application.
#[async_trait]
pub trait EmailVerificationRepository: Send + Sync {
    /// Persist the aggregate
    ///
    /// Idempotent for the requested and verified stages: saving them again
    /// unchanged is a no-op, while a verified stage different from the stored
    /// one fails with `AlreadyVerified`. The consumed stage is write-once;
    /// storing it a second time fails with `AlreadyConsumed`. At most one
    /// unexpired pending record may exist per `(email, intent_type)`; saving
    /// a second one fails.
    async fn save(&self, verification: &EmailVerification) -> Result<(), DomainError>;

    /// Find a verification by its identifier
    async fn find_by_id(&self, id: Uuid) -> Result<Option<EmailVerification>, DomainError>;

    /// Find the most recent requested, not yet verified record for an email and intent
    ///
    /// The record may already be expired; callers decide whether to reuse it.
    async fn find_pending(
        &self,
        email: &str,
        intent_type: IntentType,
    ) -> Result<Option<EmailVerification>, DomainError>;

    /// Find a verification by the token issued when it was requested
    async fn find_by_request_token(
        &self,
        token: &str,
    ) -> Result<Option<EmailVerification>, DomainError>;

    /// Find a verification by the token issued when it was verified
    async fn find_by_verified_token(
        &self,
        token: &str,
    ) -> Result<Option<EmailVerification>, DomainError>;
}
