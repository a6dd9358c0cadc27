/// Error types for Likes Service
///
/// Dependency failures are split by what they mean for the caller: nothing was
/// persisted (503) versus the like was persisted but its count may be stale (502).
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use error_types::{error_codes, HttpErrorResponse};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("User has already liked this post")]
    DuplicateLike,

    #[error("{0}")]
    NotFound(String),

    /// The counter call failed and the like was rolled back
    #[error("Like not recorded: {0}")]
    LikeNotRecorded(String),

    /// The counter call failed and the like was kept
    #[error("Like not removed: {0}")]
    LikeNotRemoved(String),

    /// Like state and counter may disagree until reconciliation
    #[error("Like count may be stale: {0}")]
    LikeCountStale(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn like_not_found() -> Self {
        AppError::NotFound("Like not found".to_string())
    }

    pub fn post_not_found() -> Self {
        AppError::NotFound("Post not found".to_string())
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => error_codes::VALIDATION_ERROR,
            AppError::DuplicateLike => error_codes::DUPLICATE_LIKE,
            AppError::NotFound(_) => error_codes::NOT_FOUND,
            AppError::LikeNotRecorded(_) => error_codes::LIKE_NOT_RECORDED,
            AppError::LikeNotRemoved(_) => error_codes::LIKE_NOT_REMOVED,
            AppError::LikeCountStale(_) => error_codes::LIKE_COUNT_STALE,
            AppError::Database(_) => error_codes::DATABASE_ERROR,
            AppError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::LikeNotRecorded(_) => {
                "Like was not recorded because the post counter is unavailable; retry later"
                    .to_string()
            }
            AppError::LikeNotRemoved(_) => {
                "Like was not removed because the post counter is unavailable; retry later"
                    .to_string()
            }
            AppError::LikeCountStale(_) => {
                "Like state changed but the post's like count may be briefly stale".to_string()
            }
            AppError::Database(_) => "Database operation failed".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::DuplicateLike => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::LikeNotRecorded(_) | AppError::LikeNotRemoved(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::LikeCountStale(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        }

        HttpResponse::build(status).json(HttpErrorResponse::new(
            status.as_u16(),
            self.code(),
            self.public_message(),
        ))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, HttpErrorResponse) {
        let resp = err.error_response();
        let status = resp.status();
        let body = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[actix_rt::test]
    async fn test_dependency_failures_are_distinguishable() {
        let (status, body) = body_of(AppError::LikeNotRecorded("timeout".into())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, error_codes::LIKE_NOT_RECORDED);

        let (status, body) = body_of(AppError::LikeCountStale("revert failed".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.code, error_codes::LIKE_COUNT_STALE);

        let (status, body) = body_of(AppError::Database("pool timed out".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, error_codes::DATABASE_ERROR);
        assert!(!body.message.contains("pool"));
    }

    #[actix_rt::test]
    async fn test_duplicate_like_is_client_error() {
        let (status, body) = body_of(AppError::DuplicateLike).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, error_codes::DUPLICATE_LIKE);
    }
}
