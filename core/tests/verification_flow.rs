//! End-to-end flow through the public API: request, verify, consume, session

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    use vf_core::errors::{CacheError, DomainError, VerificationError};
    use vf_core::repositories::InMemoryEmailVerificationRepository;
    use vf_core::services::auth::AuthService;
    use vf_core::services::clock::{Clock, SystemClock};
    use vf_core::services::secret::SecretGenerator;
    use vf_core::services::session::{
        KeyValueStore, SessionConfig, SessionIssuer, SessionService, SessionStore,
    };
    use vf_core::services::verification::{
        EmailVerificationService, VerificationMailer, VerificationServiceConfig,
    };
    use vf_core::IntentType;

    #[derive(Default)]
    struct Outbox {
        pins: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl VerificationMailer for Outbox {
        async fn send_pin(&self, email: &str, _intent: IntentType, pin: &str) -> Result<(), String> {
            self.pins
                .lock()
                .unwrap()
                .insert(email.to_string(), pin.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &[u8], _ttl: Option<StdDuration>) -> Result<(), CacheError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn del(&self, key: &str) -> Result<bool, CacheError> {
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn exists(&self, key: &str) -> Result<bool, CacheError> {
            Ok(self.entries.lock().unwrap().contains_key(key))
        }

        async fn ping(&self) -> Result<(), CacheError> {
            Ok(())
        }
    }

    fn build(
        expires_in: chrono::Duration,
    ) -> (
        AuthService<InMemoryEmailVerificationRepository, Outbox, MapStore>,
        Arc<Outbox>,
    ) {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let outbox = Arc::new(Outbox::default());

        let verification = EmailVerificationService::new(
            Arc::new(InMemoryEmailVerificationRepository::new()),
            outbox.clone(),
            SecretGenerator::os(),
            clock.clone(),
            VerificationServiceConfig { expires_in },
        );

        let config = SessionConfig {
            secret: "integration-secret".to_string(),
            ..SessionConfig::default()
        };
        let issuer = SessionIssuer::new(config, clock.clone()).unwrap();
        let store = SessionStore::new(Arc::new(MapStore::default()), None, clock);
        let sessions = SessionService::new(issuer, store);

        (
            AuthService::new(Arc::new(verification), Arc::new(sessions)),
            outbox,
        )
    }

    #[tokio::test]
    async fn test_sign_up_flow() {
        let (auth, outbox) = build(chrono::Duration::hours(1));
        let ctx = CancellationToken::new();
        let email = "dana@example.com";

        let requested = auth
            .verification()
            .request_verification(&ctx, email, IntentType::SignUp)
            .await
            .unwrap();
        let pin = outbox.pins.lock().unwrap().get(email).cloned().unwrap();
        assert_eq!(pin.len(), 6);

        let verified = auth
            .verification()
            .verify_email(&ctx, &requested.token, &pin)
            .await
            .unwrap();

        let user_id = Uuid::new_v4();
        let session = auth
            .complete_verification(&ctx, &verified.verified_token, user_id)
            .await
            .unwrap();
        assert_eq!(auth.authenticate(&session.tokens.access.value).await.unwrap().user_id, user_id);

        // The verification is now terminal
        let again = auth
            .verification()
            .verify_email(&ctx, &requested.token, &pin)
            .await;
        assert!(matches!(
            again,
            Err(DomainError::Verification(VerificationError::AlreadyConsumed))
        ));
    }

    #[tokio::test]
    async fn test_expired_verification_is_not_advanced() {
        let (auth, outbox) = build(chrono::Duration::nanoseconds(1));
        let ctx = CancellationToken::new();
        let email = "erin@example.com";

        let requested = auth
            .verification()
            .request_verification(&ctx, email, IntentType::ResetPassword)
            .await
            .unwrap();
        let pin = outbox.pins.lock().unwrap().get(email).cloned().unwrap();

        tokio::time::sleep(StdDuration::from_millis(1)).await;

        let result = auth
            .verification()
            .verify_email(&ctx, &requested.token, &pin)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Verification(VerificationError::TokenExpired))
        ));
    }
}
