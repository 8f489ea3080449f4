//! Integration tests for bearer-protected session routes

mod common;

use actix_web::{http::header, http::StatusCode, test};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use vf_api::app::create_app;

use common::test_context;

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

#[actix_web::test]
async fn test_missing_bearer_is_unauthorized() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/api/v1/auth/session").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_web::test]
async fn test_garbage_bearer_is_invalid_session() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/session")
        .insert_header(bearer("not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "SESSION_INVALID");
}

#[actix_web::test]
async fn test_refresh_token_is_not_an_access_token() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone())).await;
    let session = ctx
        .state
        .auth
        .sign_in(&CancellationToken::new(), Uuid::new_v4())
        .await
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/session")
        .insert_header(bearer(&session.tokens.refresh.value))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_refresh_rotates_tokens() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone())).await;
    let user_id = Uuid::new_v4();
    let session = ctx
        .state
        .auth
        .sign_in(&CancellationToken::new(), user_id)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/sessions/refresh")
        .set_json(json!({ "refresh_token": session.tokens.refresh.value }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user_id"], user_id.to_string());
    let new_access = body["access_token"].as_str().unwrap().to_string();

    // Old access token is gone
    let req = test::TestRequest::get()
        .uri("/api/v1/auth/session")
        .insert_header(bearer(&session.tokens.access.value))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    // Old refresh token cannot be replayed
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/sessions/refresh")
        .set_json(json!({ "refresh_token": session.tokens.refresh.value }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/session")
        .insert_header(bearer(&new_access))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_sign_out_ends_session() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone())).await;
    let session = ctx
        .state
        .auth
        .sign_in(&CancellationToken::new(), Uuid::new_v4())
        .await
        .unwrap();
    let access = session.tokens.access.value.clone();

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/sign-out")
        .insert_header(bearer(&access))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/session")
        .insert_header(bearer(&access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "SESSION_INVALID");
}
