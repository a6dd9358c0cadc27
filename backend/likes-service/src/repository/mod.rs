pub mod likes;

pub use likes::{LikeStore, PgLikeStore, StoreResult};
