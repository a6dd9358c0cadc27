/// Configuration management for Likes Service
use anyhow::{bail, Context};
use db_pool::env_utils::parse_env_with_default;
use resilience::ServiceConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    /// Posts service (owner of like counters)
    pub posts_service: PostsServiceConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
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
pub struct PostsServiceConfig {
    pub url: String,
    /// Per attempt
    pub timeout_ms: u64,
    pub max_retries: u32,
}

impl PostsServiceConfig {
    /// Resilience settings for counter calls
    pub fn resilience(&self) -> ServiceConfig {
        resilience::http_internal_config()
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_max_retries(self.max_retries)
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: String,
}

impl LogConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
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

        let posts_service = PostsServiceConfig {
            url: std::env::var("POSTS_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3002".to_string()),
            timeout_ms: parse_env_with_default("POSTS_SERVICE_TIMEOUT_MS", 2_000),
            max_retries: parse_env_with_default("POSTS_SERVICE_MAX_RETRIES", 2),
        };
        if posts_service.timeout_ms == 0 {
            bail!("POSTS_SERVICE_TIMEOUT_MS must be greater than zero");
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_with_default("PORT", 3003),
            },
            cors: CorsConfig { allowed_origins },
            database: DatabaseConfig { url: database_url },
            posts_service,
            log: LogConfig {
                format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
        })
    }
}
