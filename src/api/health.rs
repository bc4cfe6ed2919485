use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
    pub timestamp: i64,
}

pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let database_ok = match state.users.ping().await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("⚠️  Health check: database unreachable: {}", e);
            false
        }
    };

    let body = HealthResponse {
        status: if database_ok { "healthy" } else { "degraded" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_ok { "connected" } else { "unreachable" }.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    if database_ok {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

/// Reports which pieces of configuration are present, never their values.
pub async fn ping(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "mongoUri": state.config.mongodb_uri_set,
        "jwtSecret": !state.config.jwt_secret.is_empty(),
    }))
}
