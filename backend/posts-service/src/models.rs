use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A post and its denormalized like counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: String,
    pub content: String,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `POST /posts`; `userId` is accepted as an alias of `authorId`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub author_id: Option<String>,
    pub user_id: Option<String>,
    pub content: Option<String>,
}

impl CreatePostRequest {
    /// Validated `(author_id, content)`
    pub fn validate(&self) -> Result<(String, String), String> {
        let author = self
            .author_id
            .as_deref()
            .or(self.user_id.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "userId and content are required".to_string())?;
        let content = non_blank(self.content.as_deref())
            .ok_or_else(|| "userId and content are required".to_string())?;

        Ok((author.to_string(), content))
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<String, String> {
        non_blank(self.content.as_deref()).ok_or_else(|| "content is required".to_string())
    }
}

/// Direction of a like-count adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Increment,
    Decrement,
}

impl Adjustment {
    pub fn delta(self) -> i64 {
        match self {
            Adjustment::Increment => 1,
            Adjustment::Decrement => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Adjustment::Increment => "increment",
            Adjustment::Decrement => "decrement",
        }
    }
}

/// How a key was resolved by an adjustment, echoed in the `Idempotency-Status`
/// response header. `Reverted` tells the caller the key is spent and a new
/// adjustment needs a new key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentStatus {
    Applied,
    Replayed,
    Reverted,
}

impl AdjustmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AdjustmentStatus::Applied => "applied",
            AdjustmentStatus::Replayed => "replayed",
            AdjustmentStatus::Reverted => "reverted",
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
}
