//! Backend selection and service wiring

use anyhow::{bail, Context};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use vf_core::repositories::{EmailVerificationRepository, InMemoryEmailVerificationRepository};
use vf_core::services::auth::AuthService;
use vf_core::services::clock::{Clock, SystemClock};
use vf_core::services::secret::SecretGenerator;
use vf_core::services::session::{
    KeyValueStore, SessionConfig, SessionIssuer, SessionService, SessionStore,
};
use vf_core::services::verification::{
    EmailVerificationService, VerificationMailer, VerificationServiceConfig,
};
use vf_infra::cache::{MemoryStore, RedisClient};
use vf_infra::database::{DatabasePool, MySqlEmailVerificationRepository};
use vf_infra::email::LogMailer;
use vf_shared::config::{AppConfig, CacheType};

use crate::app::AppState;

/// How often the in-process store drops expired entries
const MEMORY_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Build the application state for `config`
///
/// Connects to MySQL and Redis when configured, otherwise falls back to the
/// in-process backends. Background work stops when `AppState::shutdown` is
/// cancelled.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    if config.environment.is_production() && config.auth.jwt.is_using_default_secret() {
        bail!("JWT_SECRET must be set in production");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let shutdown = CancellationToken::new();

    let (repository, database): (Arc<dyn EmailVerificationRepository>, Option<DatabasePool>) =
        if config.database.is_in_memory() {
            tracing::warn!("No database configured, using the in-memory verification repository");
            let repository: Arc<dyn EmailVerificationRepository> =
                Arc::new(InMemoryEmailVerificationRepository::new());
            (repository, None)
        } else {
            let pool = DatabasePool::new(config.database.clone())
                .await
                .context("failed to connect to the database")?;
            pool.run_migrations()
                .await
                .context("failed to run database migrations")?;
            let repository: Arc<dyn EmailVerificationRepository> =
                Arc::new(MySqlEmailVerificationRepository::new(pool.get_pool().clone()));
            (repository, Some(pool))
        };

    let kvs: Arc<dyn KeyValueStore> = match config.cache.cache_type {
        CacheType::Redis => {
            let client = RedisClient::new(&config.cache)
                .await
                .context("failed to connect to Redis")?;
            Arc::new(client)
        }
        CacheType::Memory => {
            tracing::warn!("Using the in-process key-value store; sessions are lost on restart");
            let store = Arc::new(MemoryStore::new());
            spawn_memory_purge(store.clone(), shutdown.clone());
            let kvs: Arc<dyn KeyValueStore> = store;
            kvs
        }
    };

    let mailer: Arc<dyn VerificationMailer> = Arc::new(LogMailer::new());

    let verification_service = EmailVerificationService::new(
        repository,
        mailer,
        SecretGenerator::os(),
        clock.clone(),
        VerificationServiceConfig::from(&config.verification),
    );

    let issuer = SessionIssuer::new(SessionConfig::from(&config.auth.jwt), clock.clone())
        .context("invalid session configuration")?;
    let store = SessionStore::new(kvs, config.cache.key_prefix.clone(), clock);
    let session_service = SessionService::new(issuer, store);

    let auth = AuthService::new(Arc::new(verification_service), Arc::new(session_service));

    Ok(AppState {
        auth: Arc::new(auth),
        database,
        shutdown,
        max_payload_size: config.server.max_payload_size,
    })
}

fn spawn_memory_purge(store: Arc<MemoryStore>, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MEMORY_PURGE_INTERVAL);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let purged = store.purge_expired().await;
                    if purged > 0 {
                        tracing::debug!(purged, "Purged expired key-value entries");
                    }
                }
            }
        }
    });
}
