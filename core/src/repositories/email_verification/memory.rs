//! In-memory repository for development and tests

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::email_verification::{
    EmailVerification, IntentType, VerificationState,
};
use crate::errors::{DomainError, VerificationError};

use super::r#trait::EmailVerificationRepository;

/// Process-local [`EmailVerificationRepository`]
///
/// Mirrors the relational layout: once a stage is stored it is never
/// overwritten, only later stages are added.
#[derive(Default)]
pub struct InMemoryEmailVerificationRepository {
    records: RwLock<HashMap<Uuid, EmailVerification>>,
}

impl InMemoryEmailVerificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Merge a newer snapshot into the stored one without rewriting stored stages
///
/// A verified stage that differs from the stored one, or any second consumed
/// stage, means another writer got there first.
fn merge(stored: &EmailVerification, incoming: &EmailVerification) -> Result<EmailVerification, DomainError> {
    if let (Some(ours), Some(theirs)) = (stored.verified(), incoming.verified()) {
        if ours != theirs {
            return Err(VerificationError::AlreadyVerified.into());
        }
    }
    if stored.consumed().is_some() && incoming.consumed().is_some() {
        return Err(VerificationError::AlreadyConsumed.into());
    }

    EmailVerification::from_parts(
        stored.id(),
        stored.intent_type(),
        stored.email().to_string(),
        stored.created_at(),
        stored.requested().or(incoming.requested()).cloned(),
        stored.verified().or(incoming.verified()).cloned(),
        stored.consumed().or(incoming.consumed()).cloned(),
    )
    .map_err(DomainError::from)
}

#[async_trait]
impl EmailVerificationRepository for InMemoryEmailVerificationRepository {
    async fn save(&self, verification: &EmailVerification) -> Result<(), DomainError> {
        let mut records = self.records.write().await;

        if let Some(stored) = records.get(&verification.id()) {
            let merged = merge(stored, verification)?;
            records.insert(merged.id(), merged);
            return Ok(());
        }

        if let Some(req) = verification.requested() {
            let conflict = records.values().any(|other| {
                other.email() == verification.email()
                    && other.intent_type() == verification.intent_type()
                    && other.is_pending_at(req.requested_at)
            });
            if conflict && verification.state() == VerificationState::Requested {
                return Err(DomainError::Internal {
                    message: format!(
                        "pending verification already exists for intent {}",
                        verification.intent_type()
                    ),
                });
            }
        }

        records.insert(verification.id(), verification.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EmailVerification>, DomainError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_pending(
        &self,
        email: &str,
        intent_type: IntentType,
    ) -> Result<Option<EmailVerification>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|v| {
                v.email() == email
                    && v.intent_type() == intent_type
                    && v.state() == VerificationState::Requested
            })
            .max_by_key(|v| v.requested().map(|r| r.requested_at))
            .cloned())
    }

    async fn find_by_request_token(
        &self,
        token: &str,
    ) -> Result<Option<EmailVerification>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|v| v.requested().is_some_and(|r| r.token == token))
            .cloned())
    }

    async fn find_by_verified_token(
        &self,
        token: &str,
    ) -> Result<Option<EmailVerification>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|v| v.verified().is_some_and(|r| r.token == token))
            .cloned())
    }
}
