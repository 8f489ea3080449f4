//! Email verification aggregate.
//!
//! An `EmailVerification` proves control of an email address for one intent.
//! It moves strictly forward through `Unrequested -> Requested -> Verified ->
//! Consumed`, each stage recorded as an immutable sub-record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::VerificationError;
use crate::services::clock::Clock;
use crate::services::secret::{SecretGenerator, PIN_LENGTH, TOKEN_BYTES};

/// Namespace for account identifiers derived from verified addresses
const ACCOUNT_NAMESPACE: Uuid = Uuid::from_u128(0x6f0c_2a51_9d3e_4b7a_8c15_e2d4_7a90_b3f1);

/// Stable account identifier for a normalized email address
pub fn account_id(email: &str) -> Uuid {
    Uuid::new_v5(&ACCOUNT_NAMESPACE, email.as_bytes())
}

/// Purpose of a verification flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    SignUp,
    ResetPassword,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::SignUp => "sign_up",
            IntentType::ResetPassword => "reset_password",
        }
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sign_up" => Ok(IntentType::SignUp),
            "reset_password" => Ok(IntentType::ResetPassword),
            _ => Err(format!("Invalid intent type: {}", s)),
        }
    }
}

/// Derived lifecycle state of a verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    Unrequested,
    Requested,
    Verified,
    Consumed,
}

/// Issued PIN and request token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requested {
    pub pin_code: String,
    pub token: String,
    pub requested_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Proof that the PIN was presented in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verified {
    /// Bearer credential for the follow-up step, distinct from the request token
    pub token: String,
    pub verified_at: DateTime<Utc>,
}

/// Terminal marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumed {
    pub consumed_at: DateTime<Utc>,
}

/// Email verification aggregate
///
/// Fields are private so the stage ordering can only be changed through
/// [`request`](Self::request), [`verify`](Self::verify) and
/// [`consume`](Self::consume). Records loaded from storage go through
/// [`from_parts`](Self::from_parts), which rejects impossible combinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailVerification {
    id: Uuid,
    intent_type: IntentType,
    email: String,
    created_at: DateTime<Utc>,
    requested: Option<Requested>,
    verified: Option<Verified>,
    consumed: Option<Consumed>,
}

impl EmailVerification {
    /// Creates an unrequested verification with a freshly assigned identifier
    pub fn new(email: impl Into<String>, intent_type: IntentType, clock: &dyn Clock) -> Self {
        Self {
            id: Uuid::new_v4(),
            intent_type,
            email: email.into(),
            created_at: clock.now(),
            requested: None,
            verified: None,
            consumed: None,
        }
    }

    /// Creates a verification and immediately requests it
    pub fn start(
        email: impl Into<String>,
        intent_type: IntentType,
        expires_in: Duration,
        clock: &dyn Clock,
        secrets: &SecretGenerator,
    ) -> Result<Self, VerificationError> {
        let mut verification = Self::new(email, intent_type, clock);
        verification.request(expires_in, clock, secrets)?;
        Ok(verification)
    }

    /// Rebuilds a verification from persisted parts
    pub fn from_parts(
        id: Uuid,
        intent_type: IntentType,
        email: String,
        created_at: DateTime<Utc>,
        requested: Option<Requested>,
        verified: Option<Verified>,
        consumed: Option<Consumed>,
    ) -> Result<Self, VerificationError> {
        if verified.is_some() && requested.is_none() {
            return Err(VerificationError::Corrupted {
                reason: format!("verification {} is verified without a request", id),
            });
        }
        if consumed.is_some() && verified.is_none() {
            return Err(VerificationError::Corrupted {
                reason: format!("verification {} is consumed without being verified", id),
            });
        }
        if let Some(req) = &requested {
            if req.expires_at <= req.requested_at {
                return Err(VerificationError::Corrupted {
                    reason: format!("verification {} expires before it was requested", id),
                });
            }
        }

        Ok(Self {
            id,
            intent_type,
            email,
            created_at,
            requested,
            verified,
            consumed,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn intent_type(&self) -> IntentType {
        self.intent_type
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Account bound to the verified address
    pub fn account_id(&self) -> Uuid {
        account_id(&self.email)
    }

    pub fn requested(&self) -> Option<&Requested> {
        self.requested.as_ref()
    }

    pub fn verified(&self) -> Option<&Verified> {
        self.verified.as_ref()
    }

    pub fn consumed(&self) -> Option<&Consumed> {
        self.consumed.as_ref()
    }

    /// Current lifecycle state, derived from which sub-records are present
    pub fn state(&self) -> VerificationState {
        if self.consumed.is_some() {
            VerificationState::Consumed
        } else if self.verified.is_some() {
            VerificationState::Verified
        } else if self.requested.is_some() {
            VerificationState::Requested
        } else {
            VerificationState::Unrequested
        }
    }

    /// Whether the request exists and has not yet expired at `now`
    pub fn is_pending_at(&self, now: DateTime<Utc>) -> bool {
        self.state() == VerificationState::Requested
            && self.requested.as_ref().is_some_and(|r| now <= r.expires_at)
    }

    /// Issues a PIN and request token valid for `expires_in`
    ///
    /// Re-requesting a pending verification is a no-op: the PIN is not
    /// rotated and the expiry is not extended.
    pub fn request(
        &mut self,
        expires_in: Duration,
        clock: &dyn Clock,
        secrets: &SecretGenerator,
    ) -> Result<(), VerificationError> {
        match self.state() {
            VerificationState::Consumed => return Err(VerificationError::AlreadyConsumed),
            VerificationState::Verified => return Err(VerificationError::AlreadyVerified),
            VerificationState::Requested => return Ok(()),
            VerificationState::Unrequested => {}
        }

        if expires_in <= Duration::zero() {
            return Err(VerificationError::InvalidExpiry);
        }

        let pin_code = secrets.new_pin(PIN_LENGTH)?;
        let token = secrets.new_token(TOKEN_BYTES)?;
        let now = clock.now();
        let expires_at = now
            .checked_add_signed(expires_in)
            .ok_or(VerificationError::InvalidExpiry)?;

        self.requested = Some(Requested {
            pin_code,
            token,
            requested_at: now,
            expires_at,
        });
        Ok(())
    }

    /// Marks the verification as verified, issuing a fresh verified token
    ///
    /// The caller is responsible for matching the presented PIN first.
    /// Expiry is inclusive: verifying exactly at `expires_at` succeeds.
    pub fn verify(
        &mut self,
        clock: &dyn Clock,
        secrets: &SecretGenerator,
    ) -> Result<(), VerificationError> {
        match self.state() {
            VerificationState::Consumed => return Err(VerificationError::AlreadyConsumed),
            VerificationState::Verified => return Ok(()),
            VerificationState::Unrequested => return Err(VerificationError::NotRequested),
            VerificationState::Requested => {}
        }

        let (request_token, expires_at) = match &self.requested {
            Some(req) => (req.token.as_str(), req.expires_at),
            None => return Err(VerificationError::NotRequested),
        };

        let now = clock.now();
        if now > expires_at {
            return Err(VerificationError::TokenExpired);
        }

        let mut token = secrets.new_token(TOKEN_BYTES)?;
        while token == request_token {
            token = secrets.new_token(TOKEN_BYTES)?;
        }

        self.verified = Some(Verified {
            token,
            verified_at: now,
        });
        Ok(())
    }

    /// Marks a verified verification as consumed; terminal
    pub fn consume(&mut self, clock: &dyn Clock) -> Result<(), VerificationError> {
        match self.state() {
            VerificationState::Consumed => return Ok(()),
            VerificationState::Unrequested => return Err(VerificationError::NotRequested),
            VerificationState::Requested => return Err(VerificationError::NotVerified),
            VerificationState::Verified => {}
        }

        self.consumed = Some(Consumed {
            consumed_at: clock.now(),
        });
        Ok(())
    }
}
