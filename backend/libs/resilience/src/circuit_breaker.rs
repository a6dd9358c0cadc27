//! Circuit breaker for calls to a peer service
//!
//! - Closed: calls pass; opens after `failure_threshold` consecutive failures
//!   or once the failure rate over the last `window_size` calls reaches
//!   `error_rate_threshold` (with at least `minimum_calls` recorded).
//! - Open: calls fail fast until `timeout` has elapsed.
//! - HalfOpen: calls pass as trials; `success_threshold` successes close the
//!   circuit, one failure reopens it.
//!
//! Only errors the caller classifies as failures count. A peer answering
//! "not found" is healthy.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Consecutive HalfOpen successes that close it again
    pub success_threshold: u32,
    /// Time spent Open before trial calls
    pub timeout: Duration,
    /// Failure rate (0.0 - 1.0) over the window that opens the circuit
    pub error_rate_threshold: f64,
    pub window_size: usize,
    /// Recorded calls needed before the failure rate is trusted
    pub minimum_calls: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
            error_rate_threshold: 0.5,
            window_size: 100,
            minimum_calls: 10,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit breaker is open")]
    Open,
    #[error("call failed: {0}")]
    CallFailed(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, CircuitBreakerError::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
}

/// Last `capacity` outcomes
struct Window {
    outcomes: VecDeque<Outcome>,
    capacity: usize,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    fn push(&mut self, outcome: Outcome) {
        if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(outcome);
    }

    fn len(&self) -> usize {
        self.outcomes.len()
    }

    fn failure_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let failures = self
            .outcomes
            .iter()
            .filter(|o| **o == Outcome::Failure)
            .count();
        failures as f64 / self.outcomes.len() as f64
    }

    fn clear(&mut self) {
        self.outcomes.clear();
    }
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    trial_successes: u32,
    opened_at: Option<Instant>,
    window: Window,
}

#[derive(Clone)]
pub struct CircuitBreaker {
    name: Arc<str>,
    config: CircuitBreakerConfig,
    inner: Arc<Mutex<Inner>>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            name: Arc::from("peer"),
            inner: Arc::new(Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                trial_successes: 0,
                opened_at: None,
                window: Window::new(config.window_size),
            })),
            config,
        }
    }

    /// Name used in state-change logs
    pub fn named(mut self, name: &str) -> Self {
        self.name = Arc::from(name);
        self
    }

    /// Every error counts as a failure
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_classified(f, |_| true).await
    }

    /// Errors for which `is_failure` is false are recorded as successes
    pub async fn call_classified<F, Fut, T, E, C>(
        &self,
        f: F,
        is_failure: C,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
    {
        if !self.admit() {
            return Err(CircuitBreakerError::Open);
        }

        let result = f().await;
        let outcome = match &result {
            Err(e) if is_failure(e) => Outcome::Failure,
            _ => Outcome::Success,
        };
        self.record(outcome);

        result.map_err(CircuitBreakerError::CallFailed)
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn error_rate(&self) -> f64 {
        self.inner.lock().window.failure_rate()
    }

    fn admit(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return true;
        }

        let cooled_down = inner
            .opened_at
            .map_or(true, |at| at.elapsed() >= self.config.timeout);
        if cooled_down {
            tracing::info!(peer = %self.name, "Circuit breaker half-open, allowing trial calls");
            inner.state = CircuitState::HalfOpen;
            inner.trial_successes = 0;
            inner.consecutive_failures = 0;
        }
        cooled_down
    }

    fn record(&self, outcome: Outcome) {
        let mut inner = self.inner.lock();
        inner.window.push(outcome);

        match (outcome, inner.state) {
            (Outcome::Success, CircuitState::HalfOpen) => {
                inner.consecutive_failures = 0;
                inner.trial_successes += 1;
                if inner.trial_successes >= self.config.success_threshold {
                    tracing::info!(peer = %self.name, "Circuit breaker closed");
                    inner.state = CircuitState::Closed;
                    inner.opened_at = None;
                    inner.window.clear();
                }
            }
            (Outcome::Success, _) => {
                inner.consecutive_failures = 0;
            }
            (Outcome::Failure, CircuitState::HalfOpen) => {
                tracing::warn!(peer = %self.name, "Circuit breaker trial call failed, reopening");
                self.open(&mut inner);
            }
            (Outcome::Failure, CircuitState::Closed) => {
                inner.consecutive_failures += 1;
                let rate = inner.window.failure_rate();
                let rate_tripped = inner.window.len() >= self.config.minimum_calls
                    && rate >= self.config.error_rate_threshold;

                if inner.consecutive_failures >= self.config.failure_threshold || rate_tripped {
                    tracing::warn!(
                        peer = %self.name,
                        consecutive_failures = inner.consecutive_failures,
                        error_rate = rate,
                        "Circuit breaker opened"
                    );
                    self.open(&mut inner);
                }
            }
            (Outcome::Failure, CircuitState::Open) => {}
        }
    }

    fn open(&self, inner: &mut Inner) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.trial_successes = 0;
    }
}
