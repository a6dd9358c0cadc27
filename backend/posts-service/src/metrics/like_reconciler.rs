//! Prometheus metrics for the like-count reconciler
//!
//! Tracks cycles, their duration, and how much drift each cycle found and
//! repaired.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};
use std::time::Duration;

/// Reconciliation cycles run (success/error)
static RECONCILE_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "like_reconciler_runs_total",
        "Total number of like-count reconciliation cycles (success/error)",
        &["status"]
    )
    .expect("failed to register like_reconciler_runs_total")
});

static RECONCILE_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "like_reconciler_duration_seconds",
        "Duration of like-count reconciliation operations",
        &["operation"],
        vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0]
    )
    .expect("failed to register like_reconciler_duration_seconds")
});

/// Posts checked in the last cycle
static POSTS_CHECKED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "like_reconciler_posts_checked",
        "Number of posts checked in last reconciliation cycle"
    )
    .expect("failed to register like_reconciler_posts_checked")
});

/// Drifted counters by what happened to them
static DRIFT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "like_reconciler_drift_total",
        "Like counters found drifted, by result (corrected/skipped)",
        &["result"]
    )
    .expect("failed to register like_reconciler_drift_total")
});

static FAILED_BATCHES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "like_reconciler_failed_batches_total",
        "Reconciliation batches skipped after an error"
    )
    .expect("failed to register like_reconciler_failed_batches_total")
});

static KEYS_PURGED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "like_reconciler_keys_purged_total",
        "Expired idempotency keys purged"
    )
    .expect("failed to register like_reconciler_keys_purged_total")
});

pub fn record_run(status: &str) {
    RECONCILE_RUNS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_duration(operation: &str, duration: Duration) {
    RECONCILE_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

pub fn set_posts_checked(count: i64) {
    POSTS_CHECKED.set(count);
}

/// `corrected` of `drifted` counters were rewritten; the rest lost to a
/// concurrent adjustment
pub fn record_drift(drifted: u64, corrected: u64) {
    DRIFT_TOTAL.with_label_values(&["corrected"]).inc_by(corrected);
    DRIFT_TOTAL
        .with_label_values(&["skipped"])
        .inc_by(drifted.saturating_sub(corrected));
}

pub fn record_failed_batches(count: u64) {
    FAILED_BATCHES_TOTAL.inc_by(count);
}

pub fn record_keys_purged(count: u64) {
    KEYS_PURGED_TOTAL.inc_by(count);
}
