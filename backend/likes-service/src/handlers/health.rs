use crate::services::LikeService;
use actix_web::{web, HttpResponse};

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "likes-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn readiness(service: web::Data<LikeService>) -> HttpResponse {
    match service.ready().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "ready": true,
            "service": "likes-service"
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "ready": false,
                "service": "likes-service",
                "error": "PostgreSQL connection failed"
            }))
        }
    }
}
