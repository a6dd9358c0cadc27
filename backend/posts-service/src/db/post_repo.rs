use crate::models::Post;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const POST_COLUMNS: &str = "id, author_id, content, likes_count, created_at, updated_at";

/// Post persistence. Counter writes take a connection so they can join the
/// caller's ledger transaction.
#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create(&self, author_id: &str, content: &str) -> Result<Post, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (id, author_id, content, likes_count)
            VALUES ($1, $2, $3, 0)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    /// All posts, newest first
    pub async fn list(&self) -> Result<Vec<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn update_content(&self, id: Uuid, content: &str) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            "DELETE FROM posts WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Read a post inside a transaction, optionally holding its row lock
    pub async fn find_in(
        conn: &mut PgConnection,
        id: Uuid,
        for_update: bool,
    ) -> Result<Option<Post>, sqlx::Error> {
        let lock = if for_update { " FOR UPDATE" } else { "" };
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1{lock}"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Add `delta` to the counter, clamped at zero
    pub async fn add_likes(
        conn: &mut PgConnection,
        id: Uuid,
        delta: i64,
    ) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET likes_count = GREATEST(likes_count + $2, 0), updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Keyset page of `(id, likes_count)` ordered by id
    pub async fn page_counts(
        &self,
        after: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<(Uuid, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT id, likes_count
            FROM posts
            WHERE ($1::uuid IS NULL OR id > $1)
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Overwrite a drifted counter. Only applies if the row still holds the
    /// value the caller observed; returns whether a row changed.
    pub async fn correct_likes_count(
        &self,
        id: Uuid,
        observed: i64,
        actual: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET likes_count = $3, updated_at = NOW()
            WHERE id = $1 AND likes_count = $2 AND likes_count <> $3
            "#,
        )
        .bind(id)
        .bind(observed)
        .bind(actual.max(0))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
