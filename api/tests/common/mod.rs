//! Shared fixtures for API integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_web::web;
use async_trait::async_trait;

use vf_api::app::{AppState, DynAuthService};
use vf_core::domain::entities::email_verification::IntentType;
use vf_core::repositories::{EmailVerificationRepository, InMemoryEmailVerificationRepository};
use vf_core::services::auth::AuthService;
use vf_core::services::clock::{Clock, ManualClock};
use vf_core::services::secret::SecretGenerator;
use vf_core::services::session::{
    KeyValueStore, SessionConfig, SessionIssuer, SessionService, SessionStore,
};
use vf_core::services::verification::{
    EmailVerificationService, VerificationMailer, VerificationServiceConfig,
};
use vf_infra::cache::MemoryStore;

/// Mailer that keeps the last PIN sent to each address
#[derive(Default)]
pub struct CaptureMailer {
    pins: Mutex<HashMap<String, String>>,
}

impl CaptureMailer {
    pub fn pin_for(&self, email: &str) -> Option<String> {
        self.pins.lock().unwrap().get(email).cloned()
    }
}

#[async_trait]
impl VerificationMailer for CaptureMailer {
    async fn send_pin(&self, email: &str, _intent: IntentType, pin: &str) -> Result<(), String> {
        self.pins
            .lock()
            .unwrap()
            .insert(email.to_string(), pin.to_string());
        Ok(())
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub mailer: Arc<CaptureMailer>,
    pub clock: Arc<ManualClock>,
}

/// In-memory backends with a controllable clock
pub fn test_context() -> TestContext {
    let clock = Arc::new(ManualClock::default());
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let mailer = Arc::new(CaptureMailer::default());

    let repository: Arc<dyn EmailVerificationRepository> =
        Arc::new(InMemoryEmailVerificationRepository::new());
    let dyn_mailer: Arc<dyn VerificationMailer> = mailer.clone();
    let kvs: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let verification = EmailVerificationService::new(
        repository,
        dyn_mailer,
        SecretGenerator::os(),
        dyn_clock.clone(),
        VerificationServiceConfig::default(),
    );

    let mut session_config = SessionConfig::default();
    session_config.secret = "api-test-secret".to_string();
    let issuer = SessionIssuer::new(session_config, dyn_clock.clone()).unwrap();
    let store = SessionStore::new(kvs, Some("api-test".to_string()), dyn_clock);
    let sessions = SessionService::new(issuer, store);

    let auth: DynAuthService = AuthService::new(Arc::new(verification), Arc::new(sessions));
    let state = web::Data::new(AppState::new(Arc::new(auth), None, 16 * 1024));

    TestContext {
        state,
        mailer,
        clock,
    }
}
