pub mod posts_client;

pub use posts_client::{Adjusted, CounterError, HttpPostsClient, PostsCounter};
