/// User database operations
use crate::models::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert unless the name is taken. `None` means taken.
    async fn create_if_absent(
        &self,
        user_name: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, sqlx::Error>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;

    /// Replace the hash only if the password has not changed since
    /// `changed_at`. `None` means it has (or the user is gone).
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn ping(&self) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_if_absent(
        &self,
        user_name: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, user_name, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_name) DO NOTHING
            RETURNING id, user_name, password_hash, password_changed_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_name)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_name, password_hash, password_changed_at, created_at
            FROM users
            WHERE user_name = $1
            "#,
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_name, password_hash, password_changed_at, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<Option<User>, sqlx::Error> {
        // The new version must differ from the old one even within one microsecond
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_changed_at = GREATEST(clock_timestamp(), password_changed_at + INTERVAL '1 microsecond')
            WHERE id = $1 AND password_changed_at = $3
            RETURNING id, user_name, password_hash, password_changed_at, created_at
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(changed_at)
        .fetch_optional(&self.pool)
        .await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        db_pool::ping(&self.pool).await
    }
}
