//! MySQL implementation of the EmailVerificationRepository trait.
//!
//! The aggregate is spread over a parent table and three stage tables. A
//! stage row is inserted the first time the stage is present and never
//! rewritten. Saving a verified stage that differs from the stored one, or
//! a second consumed stage, is a conflict. The parent's unique `pending_key` column
//! serializes concurrent requests for the same email and intent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row, Transaction};
use uuid::Uuid;

use vf_core::domain::entities::email_verification::{
    Consumed, EmailVerification, IntentType, Requested, VerificationState, Verified,
};
use vf_core::errors::{DomainError, VerificationError};
use vf_core::repositories::EmailVerificationRepository;

const SELECT_VERIFICATION: &str = r#"
    SELECT v.id, v.intent_type, v.email, v.created_at,
           r.pin_code, r.token AS request_token, r.requested_at, r.expires_at,
           f.token AS verified_token, f.verified_at,
           c.consumed_at
    FROM email_verifications v
    LEFT JOIN email_verification_requested r ON r.verification_id = v.id
    LEFT JOIN email_verification_verified f ON f.verification_id = v.id
    LEFT JOIN email_verification_consumed c ON c.verification_id = v.id
"#;

/// MySQL implementation of EmailVerificationRepository
pub struct MySqlEmailVerificationRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlEmailVerificationRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Value of the unique pending claim for an email and intent
    pub(crate) fn pending_key(intent_type: IntentType, email: &str) -> String {
        format!("{}:{}", intent_type.as_str(), email)
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        value: &str,
    ) -> Result<Option<EmailVerification>, DomainError> {
        let query = format!("{} WHERE {} LIMIT 1", SELECT_VERIFICATION, condition);

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::internal("database query failed", e))?;

        row.as_ref().map(row_to_verification).transpose()
    }

    /// Insert the parent row, claiming the pending key when the record is pending
    async fn insert_parent(
        tx: &mut Transaction<'_, MySql>,
        verification: &EmailVerification,
    ) -> Result<(), DomainError> {
        let pending = match (verification.state(), verification.requested()) {
            (VerificationState::Requested, Some(req)) => Some((
                Self::pending_key(verification.intent_type(), verification.email()),
                req.requested_at,
            )),
            _ => None,
        };

        if let Some((key, now)) = &pending {
            // An expired pending record no longer blocks a new request
            sqlx::query(
                r#"
                UPDATE email_verifications v
                JOIN email_verification_requested r ON r.verification_id = v.id
                SET v.pending_key = NULL
                WHERE v.pending_key = ? AND r.expires_at < ?
                "#,
            )
            .bind(key.as_str())
            .bind(*now)
            .execute(&mut **tx)
            .await
            .map_err(|e| DomainError::internal("failed to release expired pending claim", e))?;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO email_verifications (id, intent_type, email, created_at, pending_key)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(verification.id().to_string())
        .bind(verification.intent_type().as_str())
        .bind(verification.email())
        .bind(verification.created_at())
        .bind(pending.as_ref().map(|(key, _)| key.as_str()))
        .execute(&mut **tx)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DomainError::Internal {
                    message: format!(
                        "pending verification already exists for intent {}",
                        verification.intent_type()
                    ),
                })
            }
            Err(e) => Err(DomainError::internal("failed to insert verification", e)),
        }
    }

    /// Insert stage rows that are present and not yet stored
    async fn insert_stages(
        tx: &mut Transaction<'_, MySql>,
        verification: &EmailVerification,
        stored: &StoredStages,
    ) -> Result<(), DomainError> {
        let id = verification.id().to_string();

        if let Some(req) = verification.requested() {
            sqlx::query(
                r#"
                INSERT IGNORE INTO email_verification_requested
                    (verification_id, pin_code, token, requested_at, expires_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&req.pin_code)
            .bind(&req.token)
            .bind(req.requested_at)
            .bind(req.expires_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| DomainError::internal("failed to insert requested stage", e))?;
        }

        if let Some(verified) = verification.verified() {
            if needs_verified_insert(stored.verified_token.as_deref(), verified)? {
                let result = sqlx::query(
                    r#"
                    INSERT IGNORE INTO email_verification_verified (verification_id, token, verified_at)
                    VALUES (?, ?, ?)
                    "#,
                )
                .bind(&id)
                .bind(&verified.token)
                .bind(verified.verified_at)
                .execute(&mut **tx)
                .await
                .map_err(|e| DomainError::internal("failed to insert verified stage", e))?;
                if result.rows_affected() == 0 {
                    return Err(VerificationError::AlreadyVerified.into());
                }

                sqlx::query("UPDATE email_verifications SET pending_key = NULL WHERE id = ?")
                    .bind(&id)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| DomainError::internal("failed to release pending claim", e))?;
            }
        }

        if let Some(consumed) = verification.consumed() {
            ensure_not_consumed(stored)?;

            let result = sqlx::query(
                r#"
                INSERT IGNORE INTO email_verification_consumed (verification_id, consumed_at)
                VALUES (?, ?)
                "#,
            )
            .bind(&id)
            .bind(consumed.consumed_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| DomainError::internal("failed to insert consumed stage", e))?;
            if result.rows_affected() == 0 {
                return Err(VerificationError::AlreadyConsumed.into());
            }
        }

        Ok(())
    }
}

/// Stage rows already committed for a record, read under the row lock
#[derive(Debug, Default)]
pub(crate) struct StoredStages {
    pub(crate) verified_token: Option<String>,
    pub(crate) consumed_at: Option<DateTime<Utc>>,
}

/// Whether the verified stage must be written; a different stored stage is a conflict
pub(crate) fn needs_verified_insert(
    stored_token: Option<&str>,
    incoming: &Verified,
) -> Result<bool, DomainError> {
    match stored_token {
        None => Ok(true),
        Some(token) if token == incoming.token => Ok(false),
        Some(_) => Err(VerificationError::AlreadyVerified.into()),
    }
}

/// The consumed stage is write-once
pub(crate) fn ensure_not_consumed(stored: &StoredStages) -> Result<(), DomainError> {
    if stored.consumed_at.is_some() {
        return Err(VerificationError::AlreadyConsumed.into());
    }
    Ok(())
}

fn column<'r, T>(row: &'r MySqlRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get(name)
        .map_err(|e| DomainError::internal(&format!("failed to get {}", name), e))
}

/// Convert a joined row into the aggregate
fn row_to_verification(row: &MySqlRow) -> Result<EmailVerification, DomainError> {
    let id: String = column(row, "id")?;
    let id = Uuid::parse_str(&id).map_err(|e| DomainError::internal("invalid UUID", e))?;

    let intent: String = column(row, "intent_type")?;
    let intent_type: IntentType = intent
        .parse()
        .map_err(|e: String| DomainError::internal("invalid intent_type", e))?;

    let requested = match (
        column::<Option<String>>(row, "pin_code")?,
        column::<Option<String>>(row, "request_token")?,
        column::<Option<DateTime<Utc>>>(row, "requested_at")?,
        column::<Option<DateTime<Utc>>>(row, "expires_at")?,
    ) {
        (Some(pin_code), Some(token), Some(requested_at), Some(expires_at)) => Some(Requested {
            pin_code,
            token,
            requested_at,
            expires_at,
        }),
        _ => None,
    };

    let verified = match (
        column::<Option<String>>(row, "verified_token")?,
        column::<Option<DateTime<Utc>>>(row, "verified_at")?,
    ) {
        (Some(token), Some(verified_at)) => Some(Verified { token, verified_at }),
        _ => None,
    };

    let consumed = column::<Option<DateTime<Utc>>>(row, "consumed_at")?
        .map(|consumed_at| Consumed { consumed_at });

    EmailVerification::from_parts(
        id,
        intent_type,
        column(row, "email")?,
        column(row, "created_at")?,
        requested,
        verified,
        consumed,
    )
    .map_err(DomainError::from)
}

#[async_trait]
impl EmailVerificationRepository for MySqlEmailVerificationRepository {
    async fn save(&self, verification: &EmailVerification) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::internal("failed to begin transaction", e))?;

        let existing = sqlx::query(
            r#"
            SELECT v.id, f.token AS verified_token, c.consumed_at
            FROM email_verifications v
            LEFT JOIN email_verification_verified f ON f.verification_id = v.id
            LEFT JOIN email_verification_consumed c ON c.verification_id = v.id
            WHERE v.id = ?
            FOR UPDATE
            "#,
        )
        .bind(verification.id().to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::internal("database query failed", e))?;

        let stored = match &existing {
            Some(row) => StoredStages {
                verified_token: column(row, "verified_token")?,
                consumed_at: column(row, "consumed_at")?,
            },
            None => {
                Self::insert_parent(&mut tx, verification).await?;
                StoredStages::default()
            }
        };
        Self::insert_stages(&mut tx, verification, &stored).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::internal("failed to commit verification", e))?;

        tracing::debug!(
            verification_id = %verification.id(),
            state = ?verification.state(),
            "Saved email verification"
        );
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EmailVerification>, DomainError> {
        self.fetch_one_where("v.id = ?", &id.to_string()).await
    }

    async fn find_pending(
        &self,
        email: &str,
        intent_type: IntentType,
    ) -> Result<Option<EmailVerification>, DomainError> {
        let query = format!(
            "{} WHERE v.email = ? AND v.intent_type = ? \
             AND r.token IS NOT NULL AND f.token IS NULL \
             ORDER BY r.requested_at DESC LIMIT 1",
            SELECT_VERIFICATION
        );

        let row = sqlx::query(&query)
            .bind(email)
            .bind(intent_type.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::internal("database query failed", e))?;

        row.as_ref().map(row_to_verification).transpose()
    }

    async fn find_by_request_token(
        &self,
        token: &str,
    ) -> Result<Option<EmailVerification>, DomainError> {
        self.fetch_one_where("r.token = ?", token).await
    }

    async fn find_by_verified_token(
        &self,
        token: &str,
    ) -> Result<Option<EmailVerification>, DomainError> {
        self.fetch_one_where("f.token = ?", token).await
    }
}
