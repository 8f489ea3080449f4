//! Application state and factory

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, HttpResponse,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_actix_web::TracingLogger;

use vf_core::repositories::EmailVerificationRepository;
use vf_core::services::auth::AuthService;
use vf_core::services::session::KeyValueStore;
use vf_core::services::verification::VerificationMailer;
use vf_infra::database::DatabasePool;
use vf_shared::errors::{error_codes, ErrorResponse};

use crate::handlers::json_error_handler;
use crate::middleware::SessionAuth;
use crate::routes;

/// Auth service over runtime-selected backends
pub type DynAuthService =
    AuthService<dyn EmailVerificationRepository, dyn VerificationMailer, dyn KeyValueStore>;

/// Shared state handed to every handler
pub struct AppState {
    pub auth: Arc<DynAuthService>,
    /// Present when a MySQL database backs the repository
    pub database: Option<DatabasePool>,
    /// Cancelled on shutdown; each request works on a child token
    pub shutdown: CancellationToken,
    /// Maximum JSON payload size in bytes
    pub max_payload_size: usize,
}

impl AppState {
    pub fn new(auth: Arc<DynAuthService>, database: Option<DatabasePool>, max_payload_size: usize) -> Self {
        Self {
            auth,
            database,
            shutdown: CancellationToken::new(),
            max_payload_size,
        }
    }

    /// Cancellation token for one request
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

/// Create and configure the application
pub fn create_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let auth = SessionAuth::new(state.auth.clone());
    let json_config = web::JsonConfig::default()
        .limit(state.max_payload_size)
        .error_handler(json_error_handler);

    App::new()
        .app_data(state)
        .app_data(json_config)
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(routes::health::health_check))
        .configure(|cfg| routes::configure(cfg, auth))
        .default_service(web::route().to(not_found))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
