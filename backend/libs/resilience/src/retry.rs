//! Retry with exponential backoff and jitter

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add random jitter to backoff (±30%)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("Gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
    #[error("Non-retryable failure: {0}")]
    NonRetryable(E),
}

impl<E> RetryError<E> {
    /// The error of the final attempt
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::NonRetryable(e) => e,
        }
    }
}

/// Execute a future with retry logic; every error is retried
pub async fn with_retry<F, Fut, T, E>(config: RetryConfig, f: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_if(config, |_| true, f).await
}

/// Execute a future with retry logic, retrying only errors for which
/// `should_retry` returns true. Other errors are returned immediately.
pub async fn with_retry_if<F, Fut, T, E, P>(
    config: RetryConfig,
    should_retry: P,
    mut f: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut backoff = Backoff::new(&config);
    let mut attempts = 0;

    loop {
        let e = match f().await {
            Ok(value) => return Ok(value),
            Err(e) if !should_retry(&e) => return Err(RetryError::NonRetryable(e)),
            Err(e) => e,
        };
        attempts += 1;

        let Some(delay) = backoff.next_delay() else {
            warn!(error = %e, attempts, "Giving up, retries exhausted");
            return Err(RetryError::Exhausted { attempts, last: e });
        };

        warn!(error = %e, attempt = attempts, delay_ms = delay.as_millis() as u64, "Retrying");
        tokio::time::sleep(delay).await;
    }
}

/// Delays between attempts; `None` once `max_retries` delays were handed out
struct Backoff {
    next: Duration,
    remaining: u32,
    multiplier: f64,
    cap: Duration,
    jitter: bool,
}

impl Backoff {
    fn new(config: &RetryConfig) -> Self {
        Self {
            next: config.initial_backoff,
            remaining: config.max_retries,
            multiplier: config.backoff_multiplier,
            cap: config.max_backoff,
            jitter: config.jitter,
        }
    }

    fn next_delay(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let delay = if self.jitter { jittered(self.next) } else { self.next };
        let scaled = self.next.as_nanos() as f64 * self.multiplier;
        self.next = if scaled >= self.cap.as_nanos() as f64 {
            self.cap
        } else {
            Duration::from_nanos(scaled as u64)
        };
        Some(delay)
    }
}

/// `base` scaled by a random factor in [0.7, 1.3)
fn jittered(base: Duration) -> Duration {
    base.mul_f64(rand::thread_rng().gen_range(0.7..1.3))
}
