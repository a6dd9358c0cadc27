/// Users Service Library
///
/// Registration, login and password reset. Passwords are stored as Argon2id
/// hashes; tokens are HS256 JWTs.
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
