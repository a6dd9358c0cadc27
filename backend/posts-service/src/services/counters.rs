//! Idempotent like-count adjustments
//!
//! Every adjustment and every revert runs in one transaction together with
//! its ledger row, so the counter and the ledger never disagree. Lock order is
//! always ledger key first, then the post row.

use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::metrics::like_counter as metrics;
use crate::models::{Adjustment, AdjustmentStatus, Post};
use idempotency_ledger::{Claim, IdempotencyLedger, KeyState, Revert};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct LikeCounterService {
    pool: PgPool,
    ledger: IdempotencyLedger,
}

impl LikeCounterService {
    pub fn new(pool: PgPool, ledger: IdempotencyLedger) -> Self {
        Self { pool, ledger }
    }

    /// Apply `adjustment` once per `key`. Replays return the post unchanged.
    pub async fn adjust(
        &self,
        post_id: Uuid,
        key: &str,
        adjustment: Adjustment,
    ) -> Result<(Post, AdjustmentStatus)> {
        IdempotencyLedger::validate_key(key)?;
        let scope = post_id.to_string();

        let mut tx = self.pool.begin().await?;

        match self.ledger.claim(&mut *tx, key, &scope).await? {
            Claim::Fresh => {
                let before = match PostRepository::find_in(&mut *tx, post_id, true).await? {
                    Some(post) => post,
                    None => {
                        tx.rollback().await?;
                        return Err(AppError::post_not_found());
                    }
                };

                let after = PostRepository::add_likes(&mut *tx, post_id, adjustment.delta())
                    .await?
                    .ok_or_else(AppError::post_not_found)?;
                let effect = after.likes_count - before.likes_count;

                self.ledger.record_effect(&mut *tx, key, effect).await?;
                tx.commit().await?;

                tracing::info!(
                    post_id = %post_id,
                    key = %key,
                    adjustment = adjustment.as_str(),
                    effect,
                    likes_count = after.likes_count,
                    "Like count adjusted"
                );
                metrics::record_adjustment(adjustment.as_str(), AdjustmentStatus::Applied.as_str());
                Ok((after, AdjustmentStatus::Applied))
            }
            Claim::Replayed(state) => {
                let post = PostRepository::find_in(&mut *tx, post_id, false)
                    .await?
                    .ok_or_else(AppError::post_not_found)?;
                tx.commit().await?;

                tracing::debug!(
                    post_id = %post_id,
                    key = %key,
                    state = state.as_str(),
                    "Like count adjustment replayed"
                );
                let status = match state {
                    KeyState::Applied => AdjustmentStatus::Replayed,
                    KeyState::Reverted => AdjustmentStatus::Reverted,
                };
                metrics::record_adjustment(adjustment.as_str(), status.as_str());
                Ok((post, status))
            }
        }
    }

    /// Undo whatever `key` applied. Unknown keys are tombstoned so that a late
    /// original delivery becomes a replay.
    pub async fn revert(&self, post_id: Uuid, key: &str) -> Result<Post> {
        IdempotencyLedger::validate_key(key)?;
        let scope = post_id.to_string();

        let mut tx = self.pool.begin().await?;

        let outcome = self.ledger.revert(&mut *tx, key, &scope).await?;

        let current = match PostRepository::find_in(&mut *tx, post_id, true).await? {
            Some(post) => post,
            None => {
                tx.rollback().await?;
                return Err(AppError::post_not_found());
            }
        };

        let undo = outcome.effect_to_undo();
        let post = if undo == 0 {
            current
        } else {
            PostRepository::add_likes(&mut *tx, post_id, -undo)
                .await?
                .ok_or_else(AppError::post_not_found)?
        };
        tx.commit().await?;

        tracing::info!(
            post_id = %post_id,
            key = %key,
            outcome = ?outcome,
            likes_count = post.likes_count,
            "Like count adjustment reverted"
        );
        let status = match outcome {
            Revert::Undo { .. } => "undone",
            Revert::Tombstoned => "tombstoned",
            Revert::AlreadyReverted => "already_reverted",
        };
        metrics::record_adjustment("revert", status);
        Ok(post)
    }
}
