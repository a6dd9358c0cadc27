pub mod users;

pub use users::{PgUserStore, UserStore};

use db_pool::{create_pool as create_pg_pool, DbConfig};
use sqlx::migrate::Migrator;
use sqlx::PgPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create the pool and bring the schema up to date
pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let cfg = DbConfig::with_url("users-service", database_url.to_string());
    cfg.log_config();
    let pool = create_pg_pool(cfg).await?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}
