/// Preset configurations for outbound calls
use crate::circuit_breaker::CircuitBreakerConfig;
use crate::retry::RetryConfig;
use crate::timeout::TimeoutConfig;
use std::time::Duration;

/// Configuration bundle for a dependency
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub timeout: TimeoutConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub retry: Option<RetryConfig>,
}

impl ServiceConfig {
    /// Override the per-attempt timeout
    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout.duration = duration;
        self
    }

    /// Override the retry budget; `0` disables retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry = if max_retries == 0 {
            None
        } else {
            let base = self.retry.unwrap_or_default();
            Some(RetryConfig {
                max_retries,
                ..base
            })
        };
        self
    }
}

/// HTTP calls between Agora services
///
/// - Timeout: 2s per attempt (a like request must not hang on the counter)
/// - Circuit breaker: 5 consecutive failures, 30s cooldown
/// - Retry: 2 attempts, safe because every mutating call carries an idempotency key
pub fn http_internal_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(2),
        },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(30),
            error_rate_threshold: 0.5,
            window_size: 100,
            minimum_calls: 20,
        },
        retry: Some(RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter: true,
        }),
    }
}
