use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use idempotency_ledger::IdempotencyLedger;
use posts_service::clients::HttpLikesClient;
use posts_service::config::{Config, CorsConfig, LogConfig};
use posts_service::db::{self, PostRepository};
use posts_service::handlers;
use posts_service::jobs::LikeReconciler;
use posts_service::services::{LikeCounterService, PostService};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
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

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, using Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Posts Service
///
/// # Routes
///
/// - `/posts` - create and list posts
/// - `/posts/{id}` - read, update, delete a post
/// - `/posts/{id}/increment-like`, `/posts/{id}/decrement-like` - idempotent counter adjustments
/// - `/posts/{id}/like-adjustments/{key}` - revert an adjustment
/// - `/health`, `/health/ready`
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log);

    tracing::info!("Starting posts-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let pool = db::init_pool(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let ledger = IdempotencyLedger::new(pool.clone(), config.reconcile.retention());
    let repo = PostRepository::new(pool.clone());
    let post_service = web::Data::new(PostService::new(repo.clone()));
    let counter_service = web::Data::new(LikeCounterService::new(pool.clone(), ledger.clone()));
    let pool_data = web::Data::new(pool.clone());

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(post_service.clone())
            .app_data(counter_service.clone())
            .wrap(build_cors(&cors_config))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .shutdown_timeout(30)
    .run();

    let server_handle = server.handle();
    let mut tasks: JoinSet<io::Result<()>> = JoinSet::new();

    tasks.spawn(async move {
        tracing::info!("HTTP server is running");
        server.await
    });

    if config.reconcile.enabled {
        let likes_config = resilience::http_internal_config()
            .with_timeout(Duration::from_millis(config.likes_service.timeout_ms));
        let likes_client = Arc::new(HttpLikesClient::new(&config.likes_service.url, likes_config));
        let reconciler = LikeReconciler::new(
            repo.clone(),
            likes_client,
            ledger.clone(),
            config.reconcile.clone(),
        );
        tasks.spawn(async move {
            reconciler.run().await;
            Ok(())
        });
    } else {
        tracing::warn!("Like-count reconciliation disabled (RECONCILE_ENABLED=false)");
    }

    // The first task to finish, or a signal, brings the whole service down
    let outcome = tokio::select! {
        joined = tasks.join_next() => match joined {
            Some(Ok(result)) => result,
            Some(Err(e)) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
            None => Ok(()),
        },
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
    };

    if let Err(e) = &outcome {
        tracing::error!(error = %e, "Service task failed");
    }
    server_handle.stop(true).await;
    tasks.shutdown().await;

    pool.close().await;
    tracing::info!("posts-service shutting down");

    outcome.context("posts-service exited with an error")
}
