/// HTTP handlers for likes-service
pub mod health;
pub mod likes;

use crate::error::AppError;
use actix_web::{error::JsonPayloadError, error::QueryPayloadError, web, HttpRequest};

/// Register every route. Shared by `main` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .route("/health", web::get().to(health::liveness))
        .route("/health/ready", web::get().to(health::readiness))
        .route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .service(
            web::scope("/likes")
                .service(
                    web::resource("")
                        .route(web::post().to(likes::create_like))
                        .route(web::get().to(likes::list_likes)),
                )
                // Registered before `/{id}` so "counts" is never taken for an id
                .route("/counts", web::get().to(likes::like_counts))
                .route("/{id}", web::delete().to(likes::delete_like)),
        );
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid JSON body: {}", err)).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid query string: {}", err)).into()
}
