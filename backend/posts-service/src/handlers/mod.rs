/// HTTP handlers for posts-service
pub mod counters;
pub mod health;
pub mod posts;

use crate::error::AppError;
use actix_web::{error::JsonPayloadError, web, HttpRequest};
use uuid::Uuid;

/// Register every route. Shared by `main` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/health", web::get().to(health::liveness))
        .route("/health/ready", web::get().to(health::readiness))
        .route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .service(
            web::scope("/posts")
                .service(
                    web::resource("")
                        .route(web::post().to(posts::create_post))
                        .route(web::get().to(posts::list_posts)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(posts::get_post))
                        .route(web::put().to(posts::update_post))
                        .route(web::delete().to(posts::delete_post)),
                )
                .route("/{id}/increment-like", web::put().to(counters::increment_like))
                .route("/{id}/decrement-like", web::put().to(counters::decrement_like))
                .route(
                    "/{id}/like-adjustments/{key}",
                    web::delete().to(counters::revert_adjustment),
                ),
        );
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid JSON body: {}", err)).into()
}

/// Ids that are not UUIDs cannot name a post
pub(crate) fn parse_post_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::post_not_found())
}
