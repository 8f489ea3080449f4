//! Unit tests for the session service

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::{DomainError, SessionError};

use super::mocks::{test_service, MockKeyValueStore};

#[tokio::test]
async fn test_start_then_authenticate() {
    let kvs = Arc::new(MockKeyValueStore::new());
    let service = test_service(kvs);
    let ctx = CancellationToken::new();
    let user_id = Uuid::new_v4();

    let session = service.start(&ctx, user_id).await.unwrap();
    let resolved = service.authenticate(&session.tokens.access.value).await.unwrap();

    assert_eq!(resolved, session);
}

#[tokio::test]
async fn test_authenticate_rejects_refresh_token() {
    let service = test_service(Arc::new(MockKeyValueStore::new()));
    let ctx = CancellationToken::new();
    let session = service.start(&ctx, Uuid::new_v4()).await.unwrap();

    let result = service.authenticate(&session.tokens.refresh.value).await;
    assert!(matches!(
        result,
        Err(DomainError::Session(SessionError::WrongTokenUse))
    ));
}

#[tokio::test]
async fn test_authenticate_unknown_session() {
    let service = test_service(Arc::new(MockKeyValueStore::new()));
    // Signed by the right issuer but never stored
    let session = service.issuer().new_session(Uuid::new_v4()).unwrap();

    let result = service.authenticate(&session.tokens.access.value).await;
    assert!(matches!(
        result,
        Err(DomainError::Session(SessionError::SessionNotFound))
    ));
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let kvs = Arc::new(MockKeyValueStore::new());
    let service = test_service(kvs.clone());
    let ctx = CancellationToken::new();
    let user_id = Uuid::new_v4();

    let old = service.start(&ctx, user_id).await.unwrap();
    let new = service.refresh(&ctx, &old.tokens.refresh.value).await.unwrap();

    assert_eq!(new.user_id, user_id);
    assert_ne!(new.tokens.access.value, old.tokens.access.value);
    assert_eq!(kvs.keys().len(), 2);

    assert!(service.authenticate(&new.tokens.access.value).await.is_ok());
    assert!(matches!(
        service.authenticate(&old.tokens.access.value).await,
        Err(DomainError::Session(SessionError::SessionNotFound))
    ));

    // A rotated refresh token cannot be replayed
    assert!(matches!(
        service.refresh(&ctx, &old.tokens.refresh.value).await,
        Err(DomainError::Session(SessionError::SessionNotFound))
    ));
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let service = test_service(Arc::new(MockKeyValueStore::new()));
    let ctx = CancellationToken::new();
    let session = service.start(&ctx, Uuid::new_v4()).await.unwrap();

    let result = service.refresh(&ctx, &session.tokens.access.value).await;
    assert!(matches!(
        result,
        Err(DomainError::Session(SessionError::WrongTokenUse))
    ));
}

#[tokio::test]
async fn test_cancelled_refresh_keeps_old_session() {
    let kvs = Arc::new(MockKeyValueStore::new());
    let service = test_service(kvs.clone());
    let session = service
        .start(&CancellationToken::new(), Uuid::new_v4())
        .await
        .unwrap();

    let ctx = CancellationToken::new();
    ctx.cancel();
    let result = service.refresh(&ctx, &session.tokens.refresh.value).await;

    assert!(matches!(result, Err(DomainError::Cancelled)));
    assert!(service.authenticate(&session.tokens.access.value).await.is_ok());
}

#[tokio::test]
async fn test_cancelled_start_stores_nothing() {
    let kvs = Arc::new(MockKeyValueStore::new());
    let service = test_service(kvs.clone());
    let ctx = CancellationToken::new();
    ctx.cancel();

    let result = service.start(&ctx, Uuid::new_v4()).await;
    assert!(matches!(result, Err(DomainError::Cancelled)));
    assert!(kvs.keys().is_empty());
}

#[tokio::test]
async fn test_sign_out_revokes_session() {
    let kvs = Arc::new(MockKeyValueStore::new());
    let service = test_service(kvs.clone());
    let ctx = CancellationToken::new();
    let session = service.start(&ctx, Uuid::new_v4()).await.unwrap();

    service.sign_out(&session.tokens.access.value).await.unwrap();

    assert!(kvs.keys().is_empty());
    assert!(service.sign_out(&session.tokens.access.value).await.is_err());
}

#[tokio::test]
async fn test_concurrent_refresh_rotates_once() {
    let kvs = Arc::new(MockKeyValueStore::new());
    let service = test_service(kvs.clone());
    let ctx = CancellationToken::new();
    let session = service.start(&ctx, Uuid::new_v4()).await.unwrap();
    kvs.yield_ops.store(true, Ordering::SeqCst);

    let refresh_token = session.tokens.refresh.value.as_str();
    let (first, second) = tokio::join!(
        service.refresh(&ctx, refresh_token),
        service.refresh(&ctx, refresh_token)
    );

    let rotated: Vec<_> = [first, second].into_iter().filter_map(Result::ok).collect();
    assert_eq!(rotated.len(), 1);
    // Only the winner's session remains: one access and one refresh entry
    assert_eq!(kvs.keys().len(), 2);
    assert!(service.authenticate(&rotated[0].tokens.access.value).await.is_ok());
}
