//! Shared HTTP error body for Agora services
//!
//! Every service renders its `AppError` through [`HttpErrorResponse`] so that
//! clients (and the likes-service, which parses posts-service failures) see a
//! single shape:
//!
//! ```json
//! { "status": 404, "code": "NOT_FOUND", "message": "Post not found", "timestamp": "..." }
//! ```

use serde::{Deserialize, Serialize};

/// Stable error codes carried in [`HttpErrorResponse::code`]
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const DUPLICATE_LIKE: &str = "DUPLICATE_LIKE";
    pub const USER_EXISTS: &str = "USER_EXISTS";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    /// Counter dependency failed and the like was rolled back
    pub const LIKE_NOT_RECORDED: &str = "LIKE_NOT_RECORDED";
    /// Counter dependency failed and the like was kept
    pub const LIKE_NOT_REMOVED: &str = "LIKE_NOT_REMOVED";
    /// Like state persisted but the post's counter may be stale until reconciliation
    pub const LIKE_COUNT_STALE: &str = "LIKE_COUNT_STALE";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Standard HTTP error response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// HTTP status code
    pub status: u16,

    /// Error code for client handling
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional structured context (ids involved, dependency that failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Timestamp of the error
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HttpErrorResponse {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.code == error_codes::NOT_FOUND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_without_empty_details() {
        let body = HttpErrorResponse::new(400, error_codes::VALIDATION_ERROR, "postId is required");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["status"], 400);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "postId is required");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_details_round_trip_from_peer_service() {
        let raw = r#"{
            "status": 404,
            "code": "NOT_FOUND",
            "message": "Post not found",
            "timestamp": "2025-05-30T10:30:00Z"
        }"#;

        let parsed: HttpErrorResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.is_not_found());
        assert!(parsed.details.is_none());
    }

    #[test]
    fn test_with_details() {
        let body = HttpErrorResponse::new(502, error_codes::LIKE_COUNT_STALE, "stale")
            .with_details(serde_json::json!({ "likeId": "abc" }));
        assert_eq!(body.details.unwrap()["likeId"], "abc");
    }
}
