//! Route handlers and registration

pub mod health;
pub mod session;
pub mod verification;

use actix_web::web;

use crate::middleware::SessionAuth;

/// Register the `/api/v1/auth` routes
///
/// Routes that act on the caller's own session sit behind `auth`.
pub fn configure(cfg: &mut web::ServiceConfig, auth: SessionAuth) {
    cfg.service(
        web::scope("/api/v1/auth")
            .route(
                "/verifications",
                web::post().to(verification::request_verification),
            )
            .route(
                "/verifications/verify",
                web::post().to(verification::verify_email),
            )
            .route("/sessions", web::post().to(session::create_session))
            .route("/sessions/refresh", web::post().to(session::refresh_session))
            .service(
                web::resource("/sign-out")
                    .wrap(auth.clone())
                    .route(web::post().to(session::sign_out)),
            )
            .service(
                web::resource("/session")
                    .wrap(auth)
                    .route(web::get().to(session::current_session)),
            ),
    );
}
