use crate::services::UserService;
use actix_web::{web, HttpResponse};

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "users-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn readiness(service: web::Data<UserService>) -> HttpResponse {
    match service.ready().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "ready": true,
            "service": "users-service"
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "ready": false,
                "service": "users-service",
                "error": "PostgreSQL connection failed"
            }))
        }
    }
}
