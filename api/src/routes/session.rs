//! Session endpoints

use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::app::AppState;
use crate::dto::{CreateSessionRequest, CurrentSessionResponse, RefreshSessionRequest, SessionResponse};
use crate::handlers::ApiError;
use crate::middleware::AuthContext;

/// POST /api/v1/auth/sessions
///
/// Exchanges a verified token for a session. The token works once, and the
/// session belongs to the account derived from the verified email.
pub async fn create_session(
    state: web::Data<AppState>,
    body: web::Json<CreateSessionRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let ctx = state.request_token();
    let session = state
        .auth
        .complete_email_verification(&ctx, &body.verified_token)
        .await?;

    Ok(HttpResponse::Created().json(SessionResponse::from(session)))
}

/// POST /api/v1/auth/sessions/refresh
pub async fn refresh_session(
    state: web::Data<AppState>,
    body: web::Json<RefreshSessionRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let ctx = state.request_token();
    let session = state.auth.refresh(&ctx, &body.refresh_token).await?;

    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}

/// POST /api/v1/auth/sign-out
pub async fn sign_out(
    state: web::Data<AppState>,
    auth: AuthContext,
) -> Result<HttpResponse, ApiError> {
    state.auth.sign_out(&auth.access_token).await?;
    tracing::info!(user_id = %auth.user_id, "Signed out");
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/auth/session
pub async fn current_session(auth: AuthContext) -> HttpResponse {
    HttpResponse::Ok().json(CurrentSessionResponse::from(&auth.session))
}
