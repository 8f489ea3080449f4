//! Session lifecycle: start, authenticate, rotate, sign out

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::entities::session::{Claims, Session, TokenUse};
use crate::errors::{DomainError, DomainResult, SessionError};

use super::issuer::SessionIssuer;
use super::store::SessionStore;
use super::traits::KeyValueStore;

/// Issues sessions and keeps the session table in sync
pub struct SessionService<K: KeyValueStore + ?Sized> {
    issuer: SessionIssuer,
    store: SessionStore<K>,
}

impl<K: KeyValueStore + ?Sized> SessionService<K> {
    pub fn new(issuer: SessionIssuer, store: SessionStore<K>) -> Self {
        Self { issuer, store }
    }

    pub fn issuer(&self) -> &SessionIssuer {
        &self.issuer
    }

    pub fn store(&self) -> &SessionStore<K> {
        &self.store
    }

    /// Issue and store a new session for `user_id`
    pub async fn start(&self, ctx: &CancellationToken, user_id: Uuid) -> DomainResult<Session> {
        let session = self.issuer.new_session(user_id)?;

        if ctx.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        self.store.create(&session).await?;

        tracing::info!(user_id = %user_id, "Session started");
        Ok(session)
    }

    /// Resolve the session behind an access token
    pub async fn authenticate(&self, access_token: &str) -> DomainResult<Session> {
        let claims = self.decode_as(access_token, TokenUse::Access)?;

        let session = self
            .store
            .lookup(access_token)
            .await?
            .ok_or(SessionError::SessionNotFound)?;

        ensure_subject(&claims, &session)?;
        Ok(session)
    }

    /// Exchange a refresh token for a new session, revoking the old one
    pub async fn refresh(&self, ctx: &CancellationToken, refresh_token: &str) -> DomainResult<Session> {
        let claims = self.decode_as(refresh_token, TokenUse::Refresh)?;

        let previous = self
            .store
            .lookup_refresh(refresh_token)
            .await?
            .ok_or(SessionError::SessionNotFound)?;
        ensure_subject(&claims, &previous)?;

        if ctx.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if !self.store.claim_refresh(refresh_token).await? {
            return Err(SessionError::SessionNotFound.into());
        }
        self.store.invalidate(&previous).await?;

        tracing::info!(user_id = %previous.user_id, "Session rotated");
        self.start(ctx, previous.user_id).await
    }

    /// Revoke the session behind an access token
    pub async fn sign_out(&self, access_token: &str) -> DomainResult<()> {
        let session = self.authenticate(access_token).await?;
        self.store.invalidate(&session).await?;

        tracing::info!(user_id = %session.user_id, "Session signed out");
        Ok(())
    }

    fn decode_as(&self, token: &str, expected: TokenUse) -> Result<Claims, SessionError> {
        let claims = self.issuer.decode(token)?;
        if claims.token_use != expected {
            return Err(SessionError::WrongTokenUse);
        }
        Ok(claims)
    }
}

fn ensure_subject(claims: &Claims, session: &Session) -> Result<(), SessionError> {
    match claims.user_id() {
        Ok(user_id) if user_id == session.user_id => Ok(()),
        _ => Err(SessionError::InvalidToken),
    }
}
