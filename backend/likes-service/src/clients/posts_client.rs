/// HTTP client for the posts-service like counter
///
/// Every mutating call carries an idempotency key, so retries are safe.
use async_trait::async_trait;
use error_types::HttpErrorResponse;
use reqwest::StatusCode;
use resilience::{
    with_retry_if, with_timeout, CircuitBreaker, CircuitBreakerError, RetryConfig, ServiceConfig,
};
use thiserror::Error;
use uuid::Uuid;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
pub const IDEMPOTENCY_STATUS_HEADER: &str = "Idempotency-Status";

/// What posts-service did with an adjustment key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjusted {
    /// First delivery, effect applied now
    Applied,
    /// Seen before and still in effect
    Replayed,
    /// Seen before and reverted since; the key carries no effect any more
    Reverted,
}

impl Adjusted {
    /// Missing or unknown values count as applied
    fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("reverted") => Adjusted::Reverted,
            Some("replayed") => Adjusted::Replayed,
            _ => Adjusted::Applied,
        }
    }
}

#[derive(Debug, Error)]
pub enum CounterError {
    /// Posts-service answered 404: the post does not exist
    #[error("post not found")]
    PostNotFound,

    /// Timeout, connection failure, 5xx, or open circuit
    #[error("posts-service unavailable: {0}")]
    Unavailable(String),

    /// Any other non-success answer
    #[error("posts-service rejected the call ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl CounterError {
    pub fn is_post_not_found(&self) -> bool {
        matches!(self, CounterError::PostNotFound)
    }

    fn is_retryable(&self) -> bool {
        matches!(self, CounterError::Unavailable(_))
    }
}

/// Counter adjustments owned by posts-service
#[async_trait]
pub trait PostsCounter: Send + Sync {
    async fn increment(&self, post_id: Uuid, key: &str) -> Result<Adjusted, CounterError>;

    async fn decrement(&self, post_id: Uuid, key: &str) -> Result<Adjusted, CounterError>;

    /// Undo whatever `key` applied; tombstones the key if nothing was applied
    async fn revert(&self, post_id: Uuid, key: &str) -> Result<(), CounterError>;
}

#[derive(Clone)]
pub struct HttpPostsClient {
    http: reqwest::Client,
    base_url: String,
    breaker: CircuitBreaker,
    config: ServiceConfig,
}

impl HttpPostsClient {
    pub fn new(base_url: &str, config: ServiceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            breaker: CircuitBreaker::new(config.circuit_breaker.clone()).named("posts-service"),
            config,
        }
    }

    fn retry_config(&self) -> RetryConfig {
        self.config.retry.clone().unwrap_or_else(|| RetryConfig {
            max_retries: 0,
            ..Default::default()
        })
    }

    async fn send(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<Adjusted, CounterError> {
        let attempt_timeout = self.config.timeout.duration;

        with_retry_if(self.retry_config(), CounterError::is_retryable, || async {
            self.breaker
                .call_classified(
                    || async {
                        with_timeout(attempt_timeout, async {
                            let resp = build()
                                .send()
                                .await
                                .map_err(|e| CounterError::Unavailable(e.to_string()))?;
                            classify(resp).await
                        })
                        .await
                        .map_err(|e| CounterError::Unavailable(e.to_string()))
                        .and_then(|r| r)
                    },
                    CounterError::is_retryable,
                )
                .await
                .map_err(|e| match e {
                    CircuitBreakerError::Open => {
                        CounterError::Unavailable("circuit breaker open".to_string())
                    }
                    CircuitBreakerError::CallFailed(inner) => inner,
                })
        })
        .await
        .map_err(|e| e.into_inner())
    }

    async fn adjust(
        &self,
        post_id: Uuid,
        key: &str,
        action: &str,
    ) -> Result<Adjusted, CounterError> {
        let url = format!("{}/posts/{}/{}", self.base_url, post_id, action);

        let result = self
            .send(|| self.http.put(&url).header(IDEMPOTENCY_KEY_HEADER, key))
            .await;

        if let Err(e) = &result {
            tracing::debug!(post_id = %post_id, key = %key, action, error = %e, "Counter call failed");
        }
        result
    }
}

#[async_trait]
impl PostsCounter for HttpPostsClient {
    async fn increment(&self, post_id: Uuid, key: &str) -> Result<Adjusted, CounterError> {
        self.adjust(post_id, key, "increment-like").await
    }

    async fn decrement(&self, post_id: Uuid, key: &str) -> Result<Adjusted, CounterError> {
        self.adjust(post_id, key, "decrement-like").await
    }

    async fn revert(&self, post_id: Uuid, key: &str) -> Result<(), CounterError> {
        let url = format!(
            "{}/posts/{}/like-adjustments/{}",
            self.base_url, post_id, key
        );
        self.send(|| self.http.delete(&url)).await.map(|_| ())
    }
}

async fn classify(resp: reqwest::Response) -> Result<Adjusted, CounterError> {
    let status = resp.status();
    if status.is_success() {
        let header = resp
            .headers()
            .get(IDEMPOTENCY_STATUS_HEADER)
            .and_then(|v| v.to_str().ok());
        return Ok(Adjusted::from_header(header));
    }
    if status == StatusCode::NOT_FOUND {
        return Err(CounterError::PostNotFound);
    }

    let message = resp
        .json::<HttpErrorResponse>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.to_string());
    Err(status_error(status, message))
}

fn status_error(status: StatusCode, message: String) -> CounterError {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        CounterError::Unavailable(format!("status {}: {}", status.as_u16(), message))
    } else {
        CounterError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}
