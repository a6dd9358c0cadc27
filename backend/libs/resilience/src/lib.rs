//! Resilience patterns for service-to-service HTTP calls
//!
//! - **Circuit Breaker**: fails fast once a peer keeps failing
//! - **Timeout**: bounds every outbound call
//! - **Retry**: exponential backoff with jitter, gated by a retryable predicate
//! - **Presets**: tuned settings for internal HTTP calls
//!
//! # Example: counter call with retry and circuit breaker
//!
//! ```rust,no_run
//! use resilience::{presets, with_retry_if, with_timeout, CircuitBreaker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = presets::http_internal_config();
//!     let breaker = CircuitBreaker::new(config.circuit_breaker.clone());
//!     let retry = config.retry.clone().unwrap_or_default();
//!
//!     let result = with_retry_if(retry, |_e: &String| true, || async {
//!         breaker
//!             .call(|| async {
//!                 with_timeout(config.timeout.duration, async { Ok::<_, String>(()) })
//!                     .await
//!                     .map_err(|e| e.to_string())
//!                     .and_then(|r| r)
//!             })
//!             .await
//!             .map_err(|e| e.to_string())
//!     })
//!     .await;
//!     let _ = result;
//! }
//! ```

pub mod circuit_breaker;
pub mod presets;
pub mod retry;
pub mod timeout;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use presets::{http_internal_config, ServiceConfig};
pub use retry::{with_retry, with_retry_if, RetryConfig, RetryError};
pub use timeout::{with_timeout, TimeoutConfig, TimeoutError};
