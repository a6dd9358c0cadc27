pub mod like_reconciler;

pub use like_reconciler::{
    plan_corrections, CounterStore, LikeReconciler, PgCounterStore, ReconcileReport,
};
