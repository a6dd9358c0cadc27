pub mod likes;

pub use likes::{decrement_key, increment_key, LikeService, MAX_DECREMENT_ROUNDS};
