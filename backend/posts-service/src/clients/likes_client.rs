/// HTTP client for the likes-service count endpoint
use async_trait::async_trait;
use resilience::{
    with_retry_if, with_timeout, CircuitBreaker, CircuitBreakerError, ServiceConfig,
};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Upper bound accepted by `GET /likes/counts`
pub const MAX_IDS_PER_CALL: usize = 500;

#[derive(Debug, Error)]
pub enum LikesClientError {
    #[error("likes-service unavailable: {0}")]
    Unavailable(String),

    #[error("likes-service returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl LikesClientError {
    fn is_retryable(&self) -> bool {
        matches!(self, LikesClientError::Unavailable(_))
    }
}

/// Where the true like counts come from
#[async_trait]
pub trait LikeCountSource: Send + Sync {
    /// Like count per post. Posts without likes may be absent from the map.
    async fn like_counts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>, LikesClientError>;
}

#[derive(Clone)]
pub struct HttpLikesClient {
    http: reqwest::Client,
    base_url: String,
    breaker: CircuitBreaker,
    config: ServiceConfig,
}

impl HttpLikesClient {
    pub fn new(base_url: &str, config: ServiceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            breaker: CircuitBreaker::new(config.circuit_breaker.clone()).named("likes-service"),
            config,
        }
    }

    async fn fetch_once(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>, LikesClientError> {
        let ids = post_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/likes/counts", self.base_url);
        let attempt_timeout: Duration = self.config.timeout.duration;

        let request = async {
            let resp = self
                .http
                .get(&url)
                .query(&[("postIds", ids.as_str())])
                .send()
                .await
                .map_err(|e| LikesClientError::Unavailable(e.to_string()))?;

            let status = resp.status();
            if status.is_server_error() {
                return Err(LikesClientError::Unavailable(format!("status {}", status)));
            }
            if !status.is_success() {
                return Err(LikesClientError::InvalidResponse(format!("status {}", status)));
            }

            resp.json::<HashMap<String, i64>>()
                .await
                .map_err(|e| LikesClientError::InvalidResponse(e.to_string()))
        };

        let raw = self
            .breaker
            .call_classified(
                || async {
                    with_timeout(attempt_timeout, request)
                        .await
                        .map_err(|e| LikesClientError::Unavailable(e.to_string()))
                        .and_then(|r| r)
                },
                LikesClientError::is_retryable,
            )
            .await
            .map_err(|e| match e {
                CircuitBreakerError::Open => {
                    LikesClientError::Unavailable("circuit breaker open".to_string())
                }
                CircuitBreakerError::CallFailed(inner) => inner,
            })?;

        parse_counts(raw)
    }
}

#[async_trait]
impl LikeCountSource for HttpLikesClient {
    async fn like_counts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>, LikesClientError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut counts = HashMap::with_capacity(post_ids.len());
        for chunk in post_ids.chunks(MAX_IDS_PER_CALL) {
            let retry = self.config.retry.clone().unwrap_or_else(|| resilience::RetryConfig {
                max_retries: 0,
                ..Default::default()
            });

            let part = with_retry_if(retry, LikesClientError::is_retryable, || {
                self.fetch_once(chunk)
            })
            .await
            .map_err(|e| e.into_inner())?;

            counts.extend(part);
        }

        Ok(counts)
    }
}

fn parse_counts(raw: HashMap<String, i64>) -> Result<HashMap<Uuid, i64>, LikesClientError> {
    raw.into_iter()
        .map(|(id, count)| {
            Uuid::parse_str(&id)
                .map(|id| (id, count))
                .map_err(|_| LikesClientError::InvalidResponse(format!("bad post id {}", id)))
        })
        .collect()
}
