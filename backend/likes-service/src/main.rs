use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use likes_service::clients::HttpPostsClient;
use likes_service::config::{Config, CorsConfig, LogConfig};
use likes_service::db;
use likes_service::handlers;
use likes_service::repository::PgLikeStore;
use likes_service::services::LikeService;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    if log.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_cors(config: &CorsConfig) -> Cors {
    let mut cors = Cors::default();
    for origin in config.allowed_origins.split(',') {
        let origin = origin.trim();
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method().allow_any_header().max_age(3600)
}

/// Likes Service
///
/// # Routes
///
/// - `/likes` - like a post, list likes
/// - `/likes/{id}` - unlike
/// - `/likes/counts` - true like counts, read by posts-service reconciliation
/// - `/health`, `/health/ready`
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log);

    tracing::info!("Starting likes-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!(
        url = %config.posts_service.url,
        timeout_ms = config.posts_service.timeout_ms,
        max_retries = config.posts_service.max_retries,
        "Posts counter client configured"
    );

    let pool = db::init_pool(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let store = Arc::new(PgLikeStore::new(pool.clone()));
    let posts = Arc::new(HttpPostsClient::new(
        &config.posts_service.url,
        config.posts_service.resilience(),
    ));
    let like_service = web::Data::new(LikeService::new(store, posts));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_config = config.cors.clone();
    // actix-web stops on SIGINT/SIGTERM by itself
    HttpServer::new(move || {
        App::new()
            .app_data(like_service.clone())
            .wrap(build_cors(&cors_config))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .shutdown_timeout(30)
    .run()
    .await
    .context("HTTP server error")?;

    pool.close().await;
    tracing::info!("likes-service shutting down");
    Ok(())
}
