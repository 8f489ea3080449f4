//! Unit tests for domain error types

use crate::errors::{
    CacheError, DomainError, SecretError, SessionError, ValidationError, VerificationError,
};

#[test]
fn test_verification_error_messages() {
    assert_eq!(
        VerificationError::AlreadyConsumed.to_string(),
        "Verification already consumed"
    );
    assert_eq!(
        VerificationError::TokenExpired.to_string(),
        "Verification token expired"
    );

    let error = VerificationError::Corrupted {
        reason: "consumed without verified".to_string(),
    };
    assert!(error.to_string().contains("consumed without verified"));
}

#[test]
fn test_secret_error_bridges_into_verification_error() {
    let error: VerificationError = SecretError::Entropy("os rng unavailable".to_string()).into();
    assert!(matches!(error, VerificationError::SecretGeneration(_)));
    assert!(error.to_string().contains("os rng unavailable"));
}

#[test]
fn test_domain_error_conversions() {
    let error: DomainError = VerificationError::NotVerified.into();
    assert!(matches!(
        error,
        DomainError::Verification(VerificationError::NotVerified)
    ));

    let error: DomainError = SessionError::SessionNotFound.into();
    assert_eq!(error.to_string(), "Session not found");

    let error: DomainError = ValidationError::InvalidEmail.into();
    assert!(matches!(error, DomainError::ValidationErr(_)));
}

#[test]
fn test_is_internal_classification() {
    assert!(DomainError::internal("repository save", "connection reset").is_internal());
    assert!(DomainError::from(SecretError::InvalidLength).is_internal());
    assert!(DomainError::from(VerificationError::Corrupted {
        reason: "x".to_string()
    })
    .is_internal());
    assert!(DomainError::from(CacheError::Store {
        message: "down".to_string()
    })
    .is_internal());

    assert!(!DomainError::from(VerificationError::InvalidCode).is_internal());
    assert!(!DomainError::from(SessionError::TokenExpired).is_internal());
    assert!(!DomainError::Cancelled.is_internal());
    assert!(!DomainError::Unauthorized.is_internal());
}

#[test]
fn test_internal_error_carries_context() {
    let error = DomainError::internal("mailer", "smtp timeout");
    assert_eq!(error.to_string(), "Internal error: mailer: smtp timeout");
}
