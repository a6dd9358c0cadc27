/// Integration tests for the resilience library
///
/// These exercise the composition the service clients use:
/// retry → circuit breaker → timeout → call
use resilience::{
    circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState},
    presets,
    retry::{with_retry_if, RetryConfig, RetryError},
    timeout::with_timeout,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum PeerError {
    NotFound,
    Unavailable,
    Timeout,
}

impl std::fmt::Display for PeerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

fn is_failure(e: &PeerError) -> bool {
    !matches!(e, PeerError::NotFound)
}

async fn guarded_call<F, Fut>(
    cb: &CircuitBreaker,
    attempt_timeout: Duration,
    f: F,
) -> Result<u32, PeerError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<u32, PeerError>>,
{
    cb.call_classified(
        || async move {
            with_timeout(attempt_timeout, f())
                .await
                .map_err(|_| PeerError::Timeout)
                .and_then(|r| r)
        },
        is_failure,
    )
    .await
    .map_err(|e| match e {
        CircuitBreakerError::Open => PeerError::Unavailable,
        CircuitBreakerError::CallFailed(inner) => inner,
    })
}

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_backoff: Duration::from_millis(5),
        jitter: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_transient_failure_then_success() {
    let cb = CircuitBreaker::new(CircuitBreakerConfig::default());
    let calls = Arc::new(AtomicU32::new(0));

    let result = with_retry_if(fast_retry(3), is_failure, || {
        let calls = calls.clone();
        let cb = cb.clone();
        async move {
            guarded_call(&cb, Duration::from_secs(1), || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(PeerError::Unavailable)
                } else {
                    Ok(7)
                }
            })
            .await
        }
    })
    .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_not_found_is_neither_retried_nor_counted() {
    let cb = CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 1,
        ..Default::default()
    });
    let calls = Arc::new(AtomicU32::new(0));

    let result = with_retry_if(fast_retry(3), is_failure, || {
        let calls = calls.clone();
        let cb = cb.clone();
        async move {
            guarded_call(&cb, Duration::from_secs(1), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PeerError::NotFound)
            })
            .await
        }
    })
    .await;

    assert!(matches!(result, Err(RetryError::NonRetryable(PeerError::NotFound))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_timeouts_exhaust_retries_and_open_circuit() {
    let cb = CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 3,
        timeout: Duration::from_secs(10),
        ..Default::default()
    });

    let result = with_retry_if(fast_retry(2), is_failure, || {
        let cb = cb.clone();
        async move {
            guarded_call(&cb, Duration::from_millis(10), || async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(1)
            })
            .await
        }
    })
    .await;

    match result {
        Err(RetryError::Exhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert_eq!(last, PeerError::Timeout);
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(cb.state(), CircuitState::Open);

    // Open circuit fails fast without invoking the peer
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();
    let fast_fail = guarded_call(&cb, Duration::from_secs(1), || async move {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    })
    .await;
    assert_eq!(fast_fail, Err(PeerError::Unavailable));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_circuit_recovers_after_cooldown() {
    let cb = CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 2,
        success_threshold: 1,
        timeout: Duration::from_millis(50),
        ..Default::default()
    });

    for _ in 0..2 {
        let _ = cb.call(|| async { Err::<(), _>("error") }).await;
    }
    assert_eq!(cb.state(), CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(100)).await;

    let result = cb.call(|| async { Ok::<_, String>(()) }).await;
    assert!(result.is_ok());
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[test]
fn test_internal_preset_is_bounded() {
    let config = presets::http_internal_config();
    assert!(config.timeout.duration <= Duration::from_secs(5));
    assert!(config.retry.is_some());
    assert!(config.circuit_breaker.minimum_calls > 0);
}
