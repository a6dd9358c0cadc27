//! Like/unlike outcomes and compensations
//!
//! `outcome` is `ok` or the lower-cased error code, so `like_not_recorded`,
//! `like_not_removed` and `like_count_stale` show how often the counter is at
//! risk of drifting.

use crate::error::AppError;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

/// Like and unlike requests by outcome
static LIKE_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "likes_requests_total",
        "Like and unlike requests by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("failed to register likes_requests_total")
});

/// Compensating actions taken after a failed step
static COMPENSATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "likes_compensations_total",
        "Rollback steps taken after a failed like or unlike (success/error)",
        &["action", "status"]
    )
    .expect("failed to register likes_compensations_total")
});

/// Decrement keys found already reverted and skipped
static DECREMENT_ROUNDS_SKIPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "likes_decrement_rounds_skipped_total",
        "Unlikes that moved past a decrement key reverted by an earlier attempt"
    )
    .expect("failed to register likes_decrement_rounds_skipped_total")
});

/// Label value for a finished request
pub fn outcome_label<T>(result: &Result<T, AppError>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(e) => e.code().to_ascii_lowercase(),
    }
}

pub fn record_request<T>(operation: &str, result: &Result<T, AppError>) {
    LIKE_REQUESTS_TOTAL
        .with_label_values(&[operation, &outcome_label(result)])
        .inc();
}

pub fn record_compensation(action: &str, succeeded: bool) {
    let status = if succeeded { "success" } else { "error" };
    COMPENSATIONS_TOTAL.with_label_values(&[action, status]).inc();
}

pub fn record_decrement_round_skipped() {
    DECREMENT_ROUNDS_SKIPPED_TOTAL.inc();
}
