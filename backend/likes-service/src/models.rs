use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of post ids accepted by `GET /likes/counts`
pub const MAX_COUNT_IDS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub user_id: String,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A validated like request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLike {
    pub user_id: String,
    pub post_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLikeRequest {
    pub user_id: Option<String>,
    pub post_id: Option<String>,
}

impl CreateLikeRequest {
    pub fn validate(&self) -> Result<NewLike, String> {
        let user_id = non_blank(self.user_id.as_deref());
        let post_id = non_blank(self.post_id.as_deref());

        let (user_id, post_id) = match (user_id, post_id) {
            (Some(u), Some(p)) => (u, p),
            _ => return Err("userId and postId are required".to_string()),
        };
        let post_id =
            Uuid::parse_str(post_id).map_err(|_| format!("postId '{}' is not a valid id", post_id))?;

        Ok(NewLike {
            user_id: user_id.to_string(),
            post_id,
        })
    }
}

/// Optional filters for `GET /likes`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LikeFilter {
    pub user_id: Option<String>,
    pub post_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLikesQuery {
    pub user_id: Option<String>,
    pub post_id: Option<String>,
}

impl ListLikesQuery {
    pub fn into_filter(self) -> Result<LikeFilter, String> {
        let post_id = match non_blank(self.post_id.as_deref()) {
            Some(raw) => Some(
                Uuid::parse_str(raw).map_err(|_| format!("postId '{}' is not a valid id", raw))?,
            ),
            None => None,
        };

        Ok(LikeFilter {
            user_id: non_blank(self.user_id.as_deref()).map(str::to_string),
            post_id,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsQuery {
    /// Comma-separated post ids
    pub post_ids: Option<String>,
}

impl CountsQuery {
    pub fn parse_ids(&self) -> Result<Vec<Uuid>, String> {
        let raw = non_blank(self.post_ids.as_deref())
            .ok_or_else(|| "postIds is required".to_string())?;

        let mut ids = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Uuid::parse_str(s).map_err(|_| format!("postId '{}' is not a valid id", s)))
            .collect::<Result<Vec<_>, _>>()?;
        ids.sort_unstable();
        ids.dedup();

        if ids.len() > MAX_COUNT_IDS {
            return Err(format!("at most {} postIds per request", MAX_COUNT_IDS));
        }
        Ok(ids)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
