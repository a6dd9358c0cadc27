/// Likes Service Library
///
/// Owns like records (one per user and post) and keeps each post's
/// `likes_count` in posts-service in step with them.
///
/// # Modules
///
/// - `handlers`: HTTP endpoints
/// - `services`: create/delete orchestration with compensation
/// - `repository`: like persistence behind the `LikeStore` trait
/// - `clients`: posts-service counter client behind the `PostsCounter` trait
/// - `metrics`: Prometheus collectors and the `/metrics` handler
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
