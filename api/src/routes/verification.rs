//! Email verification endpoints

use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::app::AppState;
use crate::dto::{
    RequestVerificationRequest, RequestVerificationResponse, VerifyEmailRequest,
    VerifyEmailResponse,
};
use crate::handlers::ApiError;

/// POST /api/v1/auth/verifications
///
/// Mails a PIN and returns the request token. Repeating the call while a
/// verification is pending returns the same token and mails the same PIN.
pub async fn request_verification(
    state: web::Data<AppState>,
    body: web::Json<RequestVerificationRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let ctx = state.request_token();
    let result = state
        .auth
        .verification()
        .request_verification(&ctx, &body.email, body.intent_type)
        .await?;

    Ok(HttpResponse::Ok().json(RequestVerificationResponse::from(result)))
}

/// POST /api/v1/auth/verifications/verify
///
/// Checks the PIN against the request token and returns a verified token.
pub async fn verify_email(
    state: web::Data<AppState>,
    body: web::Json<VerifyEmailRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let ctx = state.request_token();
    let result = state
        .auth
        .verification()
        .verify_email(&ctx, &body.token, &body.pin_code)
        .await?;

    Ok(HttpResponse::Ok().json(VerifyEmailResponse::from(result)))
}
