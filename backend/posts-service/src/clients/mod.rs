pub mod likes_client;

pub use likes_client::{HttpLikesClient, LikeCountSource, LikesClientError};
