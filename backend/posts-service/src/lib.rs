/// Posts Service Library
///
/// Owns posts and their `likes_count`. The counter is only ever changed through
/// idempotent adjustments keyed by likes-service, their reverts, and the
/// reconciliation job.
///
/// # Modules
///
/// - `handlers`: HTTP endpoints (CRUD, counter adjustments, health)
/// - `services`: post CRUD and ledger-backed counter adjustments
/// - `db`: repository and migrations
/// - `clients`: likes-service client used by reconciliation
/// - `jobs`: like-count reconciler
/// - `metrics`: Prometheus collectors and the `/metrics` handler
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
