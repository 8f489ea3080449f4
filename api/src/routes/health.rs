//! Liveness endpoint

use actix_web::{web, HttpResponse};

use crate::app::AppState;

/// GET /health
///
/// Reports the key-value store and, when configured, the database.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let cache_ok = state.auth.sessions().store().ping().await.is_ok();
    let database_ok = match &state.database {
        Some(pool) => pool.health_check().await.unwrap_or(false),
        None => true,
    };

    let body = serde_json::json!({
        "status": if cache_ok && database_ok { "healthy" } else { "degraded" },
        "service": "verifly-api",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "cache": cache_ok,
            "database": database_ok,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    if cache_ok && database_ok {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
