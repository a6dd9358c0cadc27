use crate::models::{Like, LikeFilter};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, sqlx::Error>;

/// Like persistence. Uniqueness and deletion are enforced by the store itself,
/// never by a read followed by a write.
#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Insert unless the (user, post) pair already has a like. `None` means duplicate.
    async fn insert_if_absent(&self, user_id: &str, post_id: Uuid) -> StoreResult<Option<Like>>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<Like>>;

    /// Atomic delete. `None` if the like was already gone.
    async fn delete(&self, id: Uuid) -> StoreResult<Option<Like>>;

    /// Newest first
    async fn list(&self, filter: &LikeFilter) -> StoreResult<Vec<Like>>;

    /// Like count per post; posts without likes are omitted
    async fn count_by_posts(&self, post_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Repository for Like operations
#[derive(Clone)]
pub struct PgLikeStore {
    pool: PgPool,
}

impl PgLikeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeStore for PgLikeStore {
    async fn insert_if_absent(&self, user_id: &str, post_id: Uuid) -> StoreResult<Option<Like>> {
        sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (id, user_id, post_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, post_id) DO NOTHING
            RETURNING id, user_id, post_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Like>> {
        sqlx::query_as::<_, Like>(
            r#"
            SELECT id, user_id, post_id, created_at
            FROM likes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Like>> {
        sqlx::query_as::<_, Like>(
            r#"
            DELETE FROM likes
            WHERE id = $1
            RETURNING id, user_id, post_id, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list(&self, filter: &LikeFilter) -> StoreResult<Vec<Like>> {
        sqlx::query_as::<_, Like>(
            r#"
            SELECT id, user_id, post_id, created_at
            FROM likes
            WHERE ($1::varchar IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR post_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.user_id.as_deref())
        .bind(filter.post_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_by_posts(&self, post_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT post_id, COUNT(*)
            FROM likes
            WHERE post_id = ANY($1)
            GROUP BY post_id
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        db_pool::ping(&self.pool).await
    }
}
