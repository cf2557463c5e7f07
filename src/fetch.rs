use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::crawl::CrawlTarget;

/// Upper bound on attempts per creative, config values above it are clamped.
pub const MAX_FETCH_ATTEMPTS: u8 = 10;
/// Longest single pause between two attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    pub status: u16,
    pub body: String,
}

impl RawPayload {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("building http client: {0}")]
    Client(String),
}

#[async_trait]
pub trait DetailFetcher: Send + Sync {
    /// One GET for one creative. Non-200 answers are returned, not errors.
    async fn fetch(&self, target: &CrawlTarget) -> Result<RawPayload, FetchError>;
}

pub struct HttpDetailFetcher {
    client: Client,
    max_retries: u8,
}

impl HttpDetailFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            max_retries: 3,
        })
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.clamp(1, MAX_FETCH_ATTEMPTS);
        self
    }

    fn backoff(attempt: u8) -> Duration {
        let ms = 1u64
            .checked_shl(u32::from(attempt.saturating_sub(1)))
            .and_then(|factor| factor.checked_mul(500))
            .unwrap_or(u64::MAX);
        Duration::from_millis(ms).min(MAX_BACKOFF)
    }

    fn retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

#[async_trait]
impl DetailFetcher for HttpDetailFetcher {
    async fn fetch(&self, target: &CrawlTarget) -> Result<RawPayload, FetchError> {
        let url = target.fetch_url.as_str();
        counter!("scrape_fetch_total").increment(1);

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send().await {
                Ok(rsp) => {
                    let status = rsp.status();
                    if Self::retryable(status) && attempt < self.max_retries {
                        tracing::warn!(
                            url,
                            status = status.as_u16(),
                            attempt,
                            "retryable status, backing off"
                        );
                        tokio::time::sleep(Self::backoff(attempt)).await;
                        continue;
                    }
                    let body = rsp.text().await.map_err(|e| FetchError::Transport {
                        url: url.to_string(),
                        message: e.to_string(),
                    })?;
                    return Ok(RawPayload {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tracing::warn!(url, attempt, error = %e, "request failed, retrying");
                        tokio::time::sleep(Self::backoff(attempt)).await;
                        continue;
                    }
                    return Err(FetchError::Transport {
                        url: url.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}
