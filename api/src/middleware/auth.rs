//! Bearer session authentication middleware
//!
//! Extracts the access token from the `Authorization` header, resolves it
//! through a [`SessionAuthenticator`] and injects an [`AuthContext`] into the
//! request extensions.

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};
use uuid::Uuid;

use vf_core::domain::entities::session::Session;
use vf_core::errors::DomainError;
use vf_core::repositories::EmailVerificationRepository;
use vf_core::services::auth::AuthService;
use vf_core::services::session::KeyValueStore;
use vf_core::services::verification::VerificationMailer;

use crate::handlers::ApiError;

/// Authenticated caller injected into requests
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    /// Access token the request was authenticated with
    pub access_token: String,
    pub session: Session,
}

/// Resolves an access token to a live session
#[async_trait]
pub trait SessionAuthenticator: Send + Sync {
    async fn authenticate(&self, access_token: &str) -> Result<Session, DomainError>;
}

#[async_trait]
impl<R, M, K> SessionAuthenticator for AuthService<R, M, K>
where
    R: EmailVerificationRepository + ?Sized,
    M: VerificationMailer + ?Sized,
    K: KeyValueStore + ?Sized,
{
    async fn authenticate(&self, access_token: &str) -> Result<Session, DomainError> {
        AuthService::authenticate(self, access_token).await
    }
}

/// Session authentication middleware factory
#[derive(Clone)]
pub struct SessionAuth {
    authenticator: Arc<dyn SessionAuthenticator>,
}

impl SessionAuth {
    pub fn new(authenticator: Arc<dyn SessionAuthenticator>) -> Self {
        Self { authenticator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddleware {
            service: Rc::new(service),
            authenticator: Arc::clone(&self.authenticator),
        }))
    }
}

/// Session authentication middleware service
pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
    authenticator: Arc<dyn SessionAuthenticator>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let authenticator = Arc::clone(&self.authenticator);

        Box::pin(async move {
            let token = match extract_bearer_token(&req) {
                Some(token) => token,
                None => {
                    let error = ApiError::Unauthenticated(
                        "Missing or invalid Authorization header".to_string(),
                    );
                    return Ok(req.into_response(error.error_response()).map_into_right_body());
                }
            };

            let session = match authenticator.authenticate(&token).await {
                Ok(session) => session,
                Err(e) => {
                    let error = ApiError::from(e);
                    return Ok(req.into_response(error.error_response()).map_into_right_body());
                }
            };

            tracing::debug!(user_id = %session.user_id, "Request authenticated");

            req.extensions_mut().insert(AuthContext {
                user_id: session.user_id,
                access_token: token,
                session,
            });

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

/// Extracts the Bearer token from the Authorization header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthenticated("Authentication required".to_string()).into());

        ready(result)
    }
}
