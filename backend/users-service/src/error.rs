/// Error types for Users Service
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use error_types::{error_codes, HttpErrorResponse};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("User already exists")]
    UserExists,

    /// Unknown user and wrong password look the same to the caller
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn user_not_found() -> Self {
        AppError::NotFound("User not found".to_string())
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => error_codes::VALIDATION_ERROR,
            AppError::UserExists => error_codes::USER_EXISTS,
            AppError::InvalidCredentials => error_codes::INVALID_CREDENTIALS,
            AppError::InvalidToken(_) => error_codes::INVALID_TOKEN,
            AppError::TokenExpired => error_codes::TOKEN_EXPIRED,
            AppError::NotFound(_) => error_codes::NOT_FOUND,
            AppError::Database(_) => error_codes::DATABASE_ERROR,
            AppError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::UserExists
            | AppError::InvalidCredentials
            | AppError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            AppError::TokenExpired => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let message = match self {
            AppError::Database(_) => "Database operation failed".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            // Decoder details would help forge tokens
            AppError::InvalidToken(_) => "Invalid token".to_string(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        HttpResponse::build(status).json(HttpErrorResponse::new(
            status.as_u16(),
            self.code(),
            message,
        ))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}
