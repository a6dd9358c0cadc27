pub mod counters;
pub mod posts;

pub use counters::LikeCounterService;
pub use posts::PostService;
