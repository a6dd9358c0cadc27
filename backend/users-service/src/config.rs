/// Configuration management for Users Service
use anyhow::{bail, Context};
use db_pool::env_utils::parse_env_with_default;
use std::time::Duration;

/// Shortest signing secret accepted in production
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Longest token lifetime accepted (ten years)
const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
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

/// HS256 token settings
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_secs: u64,
    pub reset_ttl_secs: u64,
}

impl JwtConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn reset_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_ttl_secs)
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("reset_ttl_secs", &self.reset_ttl_secs)
            .finish()
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

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET cannot be empty");
        }
        if is_production && secret.len() < MIN_PRODUCTION_SECRET_LEN {
            bail!(
                "JWT_SECRET must be at least {} bytes in production",
                MIN_PRODUCTION_SECRET_LEN
            );
        }

        let jwt = JwtConfig {
            secret,
            access_ttl_secs: parse_env_with_default("ACCESS_TOKEN_TTL_SECS", 7_200),
            reset_ttl_secs: parse_env_with_default("RESET_TOKEN_TTL_SECS", 900),
        };
        if jwt.access_ttl_secs == 0 || jwt.reset_ttl_secs == 0 {
            bail!("Token lifetimes must be greater than zero");
        }
        if jwt.access_ttl_secs > MAX_TOKEN_TTL_SECS || jwt.reset_ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!(
                "Token lifetimes cannot exceed {} seconds",
                MAX_TOKEN_TTL_SECS
            );
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_with_default("PORT", 3001),
            },
            cors: CorsConfig { allowed_origins },
            database: DatabaseConfig { url: database_url },
            jwt,
            log: LogConfig {
                format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
        })
    }
}
