use actix_web::{web, HttpResponse};
use sqlx::PgPool;

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "posts-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn readiness(pool: web::Data<PgPool>) -> HttpResponse {
    match db_pool::ping(&pool).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "ready": true,
            "service": "posts-service"
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "ready": false,
                "service": "posts-service",
                "error": "PostgreSQL connection failed"
            }))
        }
    }
}
