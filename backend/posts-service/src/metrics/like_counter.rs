//! Like-count adjustments by kind and key status

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

static ADJUSTMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "posts_like_adjustments_total",
        "Like-count adjustments by kind (increment/decrement/revert) and key status",
        &["kind", "status"]
    )
    .expect("failed to register posts_like_adjustments_total")
});

pub fn record_adjustment(kind: &str, status: &str) {
    ADJUSTMENTS_TOTAL.with_label_values(&[kind, status]).inc();
}
