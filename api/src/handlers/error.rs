//! Conversion of domain failures into JSON error responses
//!
//! Internal failures are logged in full and answered with a generic body so
//! storage or signing details never reach the client.

use actix_web::{error::JsonPayloadError, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use validator::ValidationErrors;

use vf_core::errors::{CacheError, DomainError, SessionError, VerificationError};
use vf_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};

/// Error type returned by every handler
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Failure reported by a core service
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Request body failed field validation
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ValidationErrors),

    /// Missing or malformed bearer credential
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
}

/// Status and client-facing code for a domain error
fn classify(error: &DomainError) -> (StatusCode, &'static str) {
    if error.is_internal() {
        return (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR);
    }

    match error {
        DomainError::Validation { .. } | DomainError::ValidationErr(_) => {
            (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR)
        }
        DomainError::NotFound { .. } | DomainError::Cache(CacheError::KeyNotFound { .. }) => {
            (StatusCode::NOT_FOUND, error_codes::NOT_FOUND)
        }
        DomainError::Unauthorized => (StatusCode::UNAUTHORIZED, error_codes::UNAUTHORIZED),
        DomainError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, error_codes::REQUEST_CANCELLED),
        DomainError::Verification(e) => match e {
            VerificationError::AlreadyConsumed => {
                (StatusCode::CONFLICT, error_codes::VERIFICATION_CONSUMED)
            }
            VerificationError::AlreadyVerified => {
                (StatusCode::CONFLICT, error_codes::VERIFICATION_ALREADY_VERIFIED)
            }
            VerificationError::NotRequested => {
                (StatusCode::CONFLICT, error_codes::VERIFICATION_NOT_REQUESTED)
            }
            VerificationError::NotVerified => {
                (StatusCode::CONFLICT, error_codes::VERIFICATION_NOT_VERIFIED)
            }
            VerificationError::TokenExpired => (StatusCode::GONE, error_codes::VERIFICATION_EXPIRED),
            VerificationError::InvalidCode => {
                (StatusCode::BAD_REQUEST, error_codes::VERIFICATION_CODE_INVALID)
            }
            VerificationError::InvalidExpiry
            | VerificationError::Corrupted { .. }
            | VerificationError::SecretGeneration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
            }
        },
        DomainError::Session(e) => match e {
            SessionError::TokenExpired => (StatusCode::UNAUTHORIZED, error_codes::SESSION_EXPIRED),
            SessionError::InvalidToken
            | SessionError::WrongTokenUse
            | SessionError::SessionNotFound => {
                (StatusCode::UNAUTHORIZED, error_codes::SESSION_INVALID)
            }
            SessionError::SigningFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
            }
        },
        _ => (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR),
    }
}

impl IntoErrorResponse for ApiError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            ApiError::Domain(error) => {
                let (status, code) = classify(error);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    ErrorResponse::new(code, "An internal error occurred")
                } else {
                    ErrorResponse::new(code, error.to_string())
                }
            }
            ApiError::InvalidRequest(errors) => {
                let fields: Vec<String> = errors
                    .field_errors()
                    .keys()
                    .map(|field| field.to_string())
                    .collect();
                ErrorResponse::new(error_codes::VALIDATION_ERROR, "Invalid request data")
                    .add_detail("fields", fields)
            }
            ApiError::Unauthenticated(reason) => {
                ErrorResponse::new(error_codes::UNAUTHORIZED, reason.clone())
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Domain(error) => classify(error).0,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        HttpResponse::build(status).json(self.to_error_response())
    }
}

/// Turn malformed JSON bodies into the standard error body
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ErrorResponse::new(error_codes::VALIDATION_ERROR, "Malformed request body")
        .add_detail("reason", err.to_string());
    actix_web::error::InternalError::from_response(err, HttpResponse::BadRequest().json(body))
        .into()
}
