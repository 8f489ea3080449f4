//! Tests for the in-memory email verification repository

use chrono::{Duration, TimeZone, Utc};

use crate::domain::entities::email_verification::{EmailVerification, IntentType, VerificationState};
use crate::errors::{DomainError, VerificationError};
use crate::repositories::email_verification::{
    EmailVerificationRepository, InMemoryEmailVerificationRepository,
};
use crate::services::clock::ManualClock;
use crate::services::secret::SecretGenerator;

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap())
}

fn requested(email: &str, clock: &ManualClock) -> EmailVerification {
    EmailVerification::start(
        email,
        IntentType::SignUp,
        Duration::hours(1),
        clock,
        &SecretGenerator::os(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_save_and_find_by_tokens() {
    let repo = InMemoryEmailVerificationRepository::new();
    let clock = clock();
    let secrets = SecretGenerator::os();
    let mut v = requested("alice@example.com", &clock);

    repo.save(&v).await.unwrap();
    let request_token = v.requested().unwrap().token.clone();
    assert_eq!(repo.find_by_request_token(&request_token).await.unwrap(), Some(v.clone()));
    assert_eq!(repo.find_by_id(v.id()).await.unwrap(), Some(v.clone()));

    v.verify(&clock, &secrets).unwrap();
    repo.save(&v).await.unwrap();
    let verified_token = v.verified().unwrap().token.clone();
    let found = repo.find_by_verified_token(&verified_token).await.unwrap().unwrap();
    assert_eq!(found.state(), VerificationState::Verified);
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_save_is_idempotent() {
    let repo = InMemoryEmailVerificationRepository::new();
    let v = requested("alice@example.com", &clock());

    repo.save(&v).await.unwrap();
    repo.save(&v).await.unwrap();

    assert_eq!(repo.len().await, 1);
    assert_eq!(repo.find_by_id(v.id()).await.unwrap(), Some(v));
}

#[tokio::test]
async fn test_stored_stages_are_not_rewritten() {
    let repo = InMemoryEmailVerificationRepository::new();
    let clock = clock();
    let secrets = SecretGenerator::os();
    let mut v = requested("alice@example.com", &clock);
    v.verify(&clock, &secrets).unwrap();
    repo.save(&v).await.unwrap();

    // A stale snapshot without the verified stage must not erase it
    let stale = EmailVerification::from_parts(
        v.id(),
        v.intent_type(),
        v.email().to_string(),
        v.created_at(),
        v.requested().cloned(),
        None,
        None,
    )
    .unwrap();
    repo.save(&stale).await.unwrap();

    let stored = repo.find_by_id(v.id()).await.unwrap().unwrap();
    assert_eq!(stored.verified(), v.verified());
}

#[tokio::test]
async fn test_find_pending_ignores_other_intents_and_verified_records() {
    let repo = InMemoryEmailVerificationRepository::new();
    let clock = clock();
    let secrets = SecretGenerator::os();

    let mut verified = requested("alice@example.com", &clock);
    verified.verify(&clock, &secrets).unwrap();
    repo.save(&verified).await.unwrap();

    let reset = EmailVerification::start(
        "alice@example.com",
        IntentType::ResetPassword,
        Duration::hours(1),
        &clock,
        &secrets,
    )
    .unwrap();
    repo.save(&reset).await.unwrap();

    assert!(repo
        .find_pending("alice@example.com", IntentType::SignUp)
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        repo.find_pending("alice@example.com", IntentType::ResetPassword)
            .await
            .unwrap()
            .map(|v| v.id()),
        Some(reset.id())
    );
}

#[tokio::test]
async fn test_second_pending_record_is_rejected() {
    let repo = InMemoryEmailVerificationRepository::new();
    let clock = clock();

    repo.save(&requested("alice@example.com", &clock)).await.unwrap();
    let duplicate = requested("alice@example.com", &clock);

    assert!(repo.save(&duplicate).await.is_err());
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_new_record_allowed_after_previous_expired() {
    let repo = InMemoryEmailVerificationRepository::new();
    let clock = clock();

    let first = requested("alice@example.com", &clock);
    repo.save(&first).await.unwrap();

    clock.advance(Duration::hours(2));
    let second = requested("alice@example.com", &clock);
    repo.save(&second).await.unwrap();

    let pending = repo
        .find_pending("alice@example.com", IntentType::SignUp)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.id(), second.id());
}

#[tokio::test]
async fn test_conflicting_stages_are_rejected() {
    let repo = InMemoryEmailVerificationRepository::new();
    let clock = clock();
    let secrets = SecretGenerator::os();
    let original = requested("alice@example.com", &clock);
    repo.save(&original).await.unwrap();

    // Two writers verify the same snapshot; only the first one lands
    let mut first = original.clone();
    first.verify(&clock, &secrets).unwrap();
    let mut second = original.clone();
    second.verify(&clock, &secrets).unwrap();

    repo.save(&first).await.unwrap();
    assert!(matches!(
        repo.save(&second).await,
        Err(DomainError::Verification(VerificationError::AlreadyVerified))
    ));

    // Two writers consume the same verified snapshot; timestamps may tie
    let mut consumed_a = first.clone();
    consumed_a.consume(&clock).unwrap();
    let consumed_b = consumed_a.clone();

    repo.save(&consumed_a).await.unwrap();
    assert!(matches!(
        repo.save(&consumed_b).await,
        Err(DomainError::Verification(VerificationError::AlreadyConsumed))
    ));

    let stored = repo.find_by_id(original.id()).await.unwrap().unwrap();
    assert_eq!(stored.verified(), first.verified());
    assert_eq!(stored.consumed(), consumed_a.consumed());
}
