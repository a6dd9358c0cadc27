/// HTTP handlers for users-service
pub mod health;
pub mod users;

use crate::error::AppError;
use actix_web::{error::JsonPayloadError, web, HttpRequest};

/// Register every route. Shared by `main` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/health", web::get().to(health::liveness))
        .route("/health/ready", web::get().to(health::readiness))
        .service(
            web::scope("/users")
                .route("/register", web::post().to(users::register))
                .route("/login", web::post().to(users::login))
                .route(
                    "/request-reset-password",
                    web::post().to(users::request_reset_password),
                )
                .route("/reset-password", web::post().to(users::reset_password)),
        );
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid JSON body: {}", err)).into()
}
