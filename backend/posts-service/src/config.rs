/// Configuration management for Posts Service
///
/// Everything comes from environment variables (optionally seeded from `.env`).
use anyhow::{bail, Context};
use db_pool::env_utils::{parse_env_flag, parse_env_with_default};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    /// Likes service (source of truth for reconciliation)
    pub likes_service: LikesServiceConfig,
    pub reconcile: ReconcileConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct LikesServiceConfig {
    pub url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub batch_size: i64,
    /// How long adjustment keys are kept before purging
    pub retention_days: u64,
}

impl ReconcileConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days * 24 * 60 * 60)
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `json` for structured output, anything else for the pretty formatter
    pub format: String,
}

impl LogConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
            Ok(value) => value,
            Err(_) if is_production => bail!("CORS_ALLOWED_ORIGINS must be set in production"),
            Err(_) => "*".to_string(),
        };
        if is_production && allowed_origins.trim() == "*" {
            bail!("CORS_ALLOWED_ORIGINS cannot be '*' in production");
        }

        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let reconcile = ReconcileConfig {
            enabled: parse_env_flag("RECONCILE_ENABLED", true),
            interval_secs: parse_env_with_default("RECONCILE_INTERVAL_SECS", 300),
            batch_size: parse_env_with_default("RECONCILE_BATCH_SIZE", 200),
            retention_days: parse_env_with_default("IDEMPOTENCY_RETENTION_DAYS", 7),
        };
        if reconcile.interval_secs == 0 {
            bail!("RECONCILE_INTERVAL_SECS must be greater than zero");
        }
        if !(1..=500).contains(&reconcile.batch_size) {
            bail!("RECONCILE_BATCH_SIZE must be between 1 and 500");
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_with_default("PORT", 3002),
            },
            cors: CorsConfig { allowed_origins },
            database: DatabaseConfig { url: database_url },
            likes_service: LikesServiceConfig {
                url: std::env::var("LIKES_SERVICE_URL")
                    .unwrap_or_else(|_| "http://localhost:3003".to_string()),
                timeout_ms: parse_env_with_default("LIKES_SERVICE_TIMEOUT_MS", 5_000),
            },
            reconcile,
            log: LogConfig {
                format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
        })
    }
}
