//! Like orchestration
//!
//! A like and the post's `likes_count` live in different services. Creation
//! writes the like first and rolls it back when the increment fails; deletion
//! decrements first and reverts the decrement when the delete fails. Both use
//! per-like idempotency keys, so retries and concurrent duplicates are absorbed
//! by posts-service.
//!
//! A reverted key stays spent on posts-service. An unlike that finds its
//! decrement key reverted by an earlier failed attempt moves on to the next
//! round's key, so the retry is counted again.

use crate::clients::{Adjusted, CounterError, PostsCounter};
use crate::error::{AppError, Result};
use crate::metrics::like_protocol as metrics;
use crate::models::{CreateLikeRequest, Like, LikeFilter};
use crate::repository::LikeStore;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Idempotency key of the increment issued when `like_id` was created
pub fn increment_key(like_id: Uuid) -> String {
    format!("like:{}:increment", like_id)
}

/// Upper bound on decrement rounds for one like; each failed-and-reverted
/// unlike uses one
pub const MAX_DECREMENT_ROUNDS: u32 = 16;

/// Idempotency key of the decrement issued in `round` when `like_id` is removed
pub fn decrement_key(like_id: Uuid, round: u32) -> String {
    match round {
        0 => format!("like:{}:decrement", like_id),
        n => format!("like:{}:decrement:{}", like_id, n),
    }
}

#[derive(Clone)]
pub struct LikeService {
    store: Arc<dyn LikeStore>,
    posts: Arc<dyn PostsCounter>,
}

impl LikeService {
    pub fn new(store: Arc<dyn LikeStore>, posts: Arc<dyn PostsCounter>) -> Self {
        Self { store, posts }
    }

    /// Record a like and count it on the post
    pub async fn create_like(&self, req: &CreateLikeRequest) -> Result<Like> {
        let result = self.record_like(req).await;
        metrics::record_request("create", &result);
        result
    }

    async fn record_like(&self, req: &CreateLikeRequest) -> Result<Like> {
        let new_like = req.validate().map_err(AppError::Validation)?;

        let like = self
            .store
            .insert_if_absent(&new_like.user_id, new_like.post_id)
            .await?
            .ok_or(AppError::DuplicateLike)?;

        let key = increment_key(like.id);
        match self.posts.increment(like.post_id, &key).await {
            Ok(_) => {
                tracing::info!(
                    like_id = %like.id,
                    post_id = %like.post_id,
                    user_id = %like.user_id,
                    "Like created"
                );
                Ok(like)
            }
            Err(CounterError::PostNotFound) => {
                // Nothing was counted; only the like row needs to go
                let deleted = self.store.delete(like.id).await;
                metrics::record_compensation("delete_like", deleted.is_ok());
                match deleted {
                    Ok(_) => Err(AppError::post_not_found()),
                    Err(e) => {
                        tracing::warn!(
                            like_id = %like.id,
                            post_id = %like.post_id,
                            error = %e,
                            "Failed to remove like for a missing post"
                        );
                        Err(AppError::LikeCountStale(format!(
                            "post {} not found and like {} could not be removed",
                            like.post_id, like.id
                        )))
                    }
                }
            }
            Err(counter_err) => self.roll_back_create(&like, &key, counter_err).await,
        }
    }

    async fn roll_back_create(&self, like: &Like, key: &str, cause: CounterError) -> Result<Like> {
        tracing::warn!(
            like_id = %like.id,
            post_id = %like.post_id,
            error = %cause,
            "Like count increment failed, rolling back like"
        );

        let deleted = self.store.delete(like.id).await;
        metrics::record_compensation("delete_like", deleted.is_ok());
        if let Err(e) = deleted {
            // The like stays; whether it was counted is unknown
            tracing::warn!(
                like_id = %like.id,
                post_id = %like.post_id,
                error = %e,
                "Rollback delete failed, like count left to reconciliation"
            );
            return Err(AppError::LikeCountStale(format!(
                "increment failed ({}) and like {} could not be rolled back",
                cause, like.id
            )));
        }

        // The increment may have landed or may still land; reverting tombstones the key
        let reverted = self.posts.revert(like.post_id, key).await;
        metrics::record_compensation(
            "revert_increment",
            matches!(reverted, Ok(()) | Err(CounterError::PostNotFound)),
        );
        match reverted {
            Ok(()) | Err(CounterError::PostNotFound) => {
                Err(AppError::LikeNotRecorded(cause.to_string()))
            }
            Err(e) => {
                // The like is gone but its increment may stand
                tracing::warn!(
                    like_id = %like.id,
                    post_id = %like.post_id,
                    key = %key,
                    error = %e,
                    "Increment revert failed, like count left to reconciliation"
                );
                Err(AppError::LikeCountStale(format!(
                    "increment failed ({}), like {} was rolled back but the increment could not be reverted: {}",
                    cause, like.id, e
                )))
            }
        }
    }

    /// Remove a like and uncount it. Decrements before deleting so the counter is
    /// never ahead of the stored likes.
    pub async fn delete_like(&self, like_id: Uuid) -> Result<()> {
        let result = self.remove_like(like_id).await;
        metrics::record_request("delete", &result);
        result
    }

    async fn remove_like(&self, like_id: Uuid) -> Result<()> {
        let like = self
            .store
            .find(like_id)
            .await?
            .ok_or_else(AppError::like_not_found)?;

        let key = self.decrement(&like).await?;

        match self.store.delete(like.id).await {
            Ok(Some(_)) => {
                tracing::info!(like_id = %like.id, post_id = %like.post_id, "Like deleted");
                Ok(())
            }
            Ok(None) => {
                // A concurrent unlike won; its decrement used the same key
                tracing::debug!(like_id = %like.id, "Like already deleted");
                Ok(())
            }
            Err(store_err) => match key {
                Some(key) => self.roll_back_delete(&like, &key, store_err).await,
                None => Err(AppError::from(store_err)),
            },
        }
    }

    /// Decrement the post once for `like`. Returns the key that carries the
    /// decrement, or `None` when the post no longer exists.
    async fn decrement(&self, like: &Like) -> Result<Option<String>> {
        for round in 0..MAX_DECREMENT_ROUNDS {
            let key = decrement_key(like.id, round);
            match self.posts.decrement(like.post_id, &key).await {
                Ok(Adjusted::Reverted) => {
                    // Spent by an earlier unlike that was rolled back
                    tracing::debug!(like_id = %like.id, key = %key, "Decrement key already reverted, using next round");
                    metrics::record_decrement_round_skipped();
                }
                Ok(_) => return Ok(Some(key)),
                Err(CounterError::PostNotFound) => {
                    tracing::debug!(like_id = %like.id, post_id = %like.post_id, "Post already gone, nothing to decrement");
                    return Ok(None);
                }
                Err(e) => {
                    tracing::warn!(
                        like_id = %like.id,
                        post_id = %like.post_id,
                        error = %e,
                        "Like count decrement failed, like kept"
                    );
                    return Err(AppError::LikeNotRemoved(e.to_string()));
                }
            }
        }

        tracing::warn!(like_id = %like.id, rounds = MAX_DECREMENT_ROUNDS, "Decrement rounds exhausted, like kept");
        Err(AppError::LikeNotRemoved(format!(
            "like {} used all {} decrement rounds",
            like.id, MAX_DECREMENT_ROUNDS
        )))
    }

    async fn roll_back_delete(&self, like: &Like, key: &str, cause: sqlx::Error) -> Result<()> {
        tracing::warn!(
            like_id = %like.id,
            post_id = %like.post_id,
            error = %cause,
            "Like delete failed, reverting decrement"
        );

        // A concurrent unlike may have removed the like under the same key;
        // then the decrement is owed and must stand
        if let Ok(None) = self.store.find(like.id).await {
            tracing::debug!(like_id = %like.id, "Like removed concurrently, keeping decrement");
            return Ok(());
        }

        let reverted = self.posts.revert(like.post_id, key).await;
        metrics::record_compensation(
            "revert_decrement",
            matches!(reverted, Ok(()) | Err(CounterError::PostNotFound)),
        );
        match reverted {
            Ok(()) | Err(CounterError::PostNotFound) => Err(AppError::from(cause)),
            Err(e) => {
                tracing::warn!(
                    like_id = %like.id,
                    post_id = %like.post_id,
                    key = %key,
                    error = %e,
                    "Decrement revert failed, like count left to reconciliation"
                );
                Err(AppError::LikeCountStale(format!(
                    "like {} was kept but its decrement could not be reverted: {}",
                    like.id, e
                )))
            }
        }
    }

    pub async fn list_likes(&self, filter: &LikeFilter) -> Result<Vec<Like>> {
        Ok(self.store.list(filter).await?)
    }

    /// True like count for each post; posts without likes report 0
    pub async fn counts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        let mut counts = self.store.count_by_posts(post_ids).await?;
        for id in post_ids {
            counts.entry(*id).or_insert(0);
        }
        Ok(counts)
    }

    pub async fn ready(&self) -> Result<()> {
        Ok(self.store.ping().await?)
    }
}
