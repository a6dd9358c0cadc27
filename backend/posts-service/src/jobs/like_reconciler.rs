//! Like-count reconciliation job
//!
//! Compensation keeps `likes_count` exact on the request path. When it cannot
//! (a revert that never reached us, a crash between steps), this job closes
//! the gap: it pages through every post, asks likes-service for the true
//! counts and rewrites the rows that drifted. It also purges old idempotency
//! keys.
//!
//! A correction only lands if the row still holds the value read at the start
//! of the batch; a concurrent adjustment wins and the next cycle re-checks.

use crate::clients::LikeCountSource;
use crate::config::ReconcileConfig;
use crate::db::PostRepository;
use crate::metrics::like_reconciler as metrics;
use async_trait::async_trait;
use idempotency_ledger::{IdempotencyLedger, LedgerResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;
use uuid::Uuid;

/// A counter that differs from the likes-service count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub post_id: Uuid,
    pub stored: i64,
    pub actual: i64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub posts_checked: usize,
    pub drifted: usize,
    pub corrected: usize,
    pub failed_batches: usize,
    pub keys_purged: u64,
}

/// Compare stored counters against the true counts. Posts missing from
/// `counts` have no likes.
pub fn plan_corrections(stored: &[(Uuid, i64)], counts: &HashMap<Uuid, i64>) -> Vec<Correction> {
    stored
        .iter()
        .filter_map(|&(post_id, stored)| {
            let actual = counts.get(&post_id).copied().unwrap_or(0).max(0);
            (stored != actual).then_some(Correction {
                post_id,
                stored,
                actual,
            })
        })
        .collect()
}

/// Counter storage the reconciler pages through and corrects
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Keyset page of `(post_id, likes_count)` ordered by id
    async fn page_counts(
        &self,
        after: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<(Uuid, i64)>, sqlx::Error>;

    /// Compare-and-set of one counter; false when the row moved on
    async fn correct_likes_count(
        &self,
        post_id: Uuid,
        observed: i64,
        actual: i64,
    ) -> Result<bool, sqlx::Error>;

    async fn purge_expired_keys(&self) -> LedgerResult<u64>;
}

/// Posts table plus the adjustment ledger
pub struct PgCounterStore {
    repo: PostRepository,
    ledger: IdempotencyLedger,
}

impl PgCounterStore {
    pub fn new(repo: PostRepository, ledger: IdempotencyLedger) -> Self {
        Self { repo, ledger }
    }
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn page_counts(
        &self,
        after: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<(Uuid, i64)>, sqlx::Error> {
        self.repo.page_counts(after, limit).await
    }

    async fn correct_likes_count(
        &self,
        post_id: Uuid,
        observed: i64,
        actual: i64,
    ) -> Result<bool, sqlx::Error> {
        self.repo.correct_likes_count(post_id, observed, actual).await
    }

    async fn purge_expired_keys(&self) -> LedgerResult<u64> {
        self.ledger.cleanup_expired().await
    }
}

pub struct LikeReconciler {
    store: Arc<dyn CounterStore>,
    likes: Arc<dyn LikeCountSource>,
    config: ReconcileConfig,
}

impl LikeReconciler {
    pub fn new(
        repo: PostRepository,
        likes: Arc<dyn LikeCountSource>,
        ledger: IdempotencyLedger,
        config: ReconcileConfig,
    ) -> Self {
        Self::with_store(Arc::new(PgCounterStore::new(repo, ledger)), likes, config)
    }

    pub fn with_store(
        store: Arc<dyn CounterStore>,
        likes: Arc<dyn LikeCountSource>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            store,
            likes,
            config,
        }
    }

    /// Run forever; cancelled by aborting the task
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            batch_size = self.config.batch_size,
            retention_days = self.config.retention_days,
            "Starting like-count reconciler"
        );

        loop {
            sleep(self.config.interval()).await;

            let cycle_start = Instant::now();
            let report = self.run_once().await;

            metrics::record_run(if report.failed_batches == 0 { "success" } else { "error" });
            metrics::record_duration("total", cycle_start.elapsed());
            metrics::set_posts_checked(report.posts_checked as i64);

            tracing::info!(
                posts_checked = report.posts_checked,
                drifted = report.drifted,
                corrected = report.corrected,
                failed_batches = report.failed_batches,
                keys_purged = report.keys_purged,
                duration_ms = cycle_start.elapsed().as_millis() as u64,
                "Like-count reconciliation cycle completed"
            );
        }
    }

    /// One full pass over all posts
    pub async fn run_once(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut cursor: Option<Uuid> = None;

        loop {
            let page = match self.store.page_counts(cursor, self.config.batch_size).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to page posts, aborting cycle");
                    report.failed_batches += 1;
                    break;
                }
            };
            let Some(&(last_id, _)) = page.last() else {
                break;
            };
            cursor = Some(last_id);
            report.posts_checked += page.len();

            if let Err(e) = self.reconcile_batch(&page, &mut report).await {
                tracing::warn!(
                    batch_size = page.len(),
                    error = %e,
                    "Failed to reconcile batch, skipping until next cycle"
                );
                report.failed_batches += 1;
            }

            if (page.len() as i64) < self.config.batch_size {
                break;
            }
        }

        match self.store.purge_expired_keys().await {
            Ok(purged) => report.keys_purged = purged,
            Err(e) => tracing::warn!(error = %e, "Failed to purge expired idempotency keys"),
        }

        metrics::record_drift(report.drifted as u64, report.corrected as u64);
        metrics::record_failed_batches(report.failed_batches as u64);
        metrics::record_keys_purged(report.keys_purged);

        report
    }

    async fn reconcile_batch(
        &self,
        page: &[(Uuid, i64)],
        report: &mut ReconcileReport,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ids: Vec<Uuid> = page.iter().map(|(id, _)| *id).collect();
        let counts = self.likes.like_counts(&ids).await?;

        let corrections = plan_corrections(page, &counts);
        report.drifted += corrections.len();

        for correction in corrections {
            let applied = self
                .store
                .correct_likes_count(correction.post_id, correction.stored, correction.actual)
                .await?;

            if applied {
                report.corrected += 1;
                tracing::warn!(
                    post_id = %correction.post_id,
                    stored = correction.stored,
                    actual = correction.actual,
                    "Corrected drifted like count"
                );
            } else {
                tracing::debug!(
                    post_id = %correction.post_id,
                    "Like count changed during reconciliation, leaving for next cycle"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_skips_matching_counts() {
        let a = Uuid::new_v4();
        let stored = vec![(a, 3)];
        let counts = HashMap::from([(a, 3)]);
        assert!(plan_corrections(&stored, &counts).is_empty());
    }

    #[test]
    fn test_plan_treats_missing_as_zero() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let stored = vec![(a, 2), (b, 0)];
        let counts = HashMap::new();

        let plan = plan_corrections(&stored, &counts);
        assert_eq!(
            plan,
            vec![Correction {
                post_id: a,
                stored: 2,
                actual: 0
            }]
        );
    }

    #[test]
    fn test_plan_raises_and_lowers() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let stored = vec![(a, 1), (b, 5)];
        let counts = HashMap::from([(a, 2), (b, 4)]);

        let plan = plan_corrections(&stored, &counts);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].actual, 2);
        assert_eq!(plan[1].actual, 4);
    }

    #[test]
    fn test_plan_never_goes_negative() {
        let a = Uuid::new_v4();
        let plan = plan_corrections(&[(a, 1)], &HashMap::from([(a, -3)]));
        assert_eq!(plan[0].actual, 0);
    }
}
