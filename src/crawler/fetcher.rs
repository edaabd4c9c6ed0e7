//! HTTP fetcher with rate limiting and retry
//!
//! Shared by the listing fetcher and the country resolver:
//! - Rate limiting with governor
//! - Automatic retry with exponential backoff on 429/5xx
//! - Bounded request timeout

use crate::config::ListingConfig;
use crate::utils::error::FetchError;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE},
    Client,
};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::time::Duration;

/// Page fetcher with retry and rate limiting
pub struct PageFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Maximum number of retry attempts for failed requests
    max_retries: u32,

    /// Base delay in milliseconds for exponential backoff
    base_delay_ms: u64,
}

impl PageFetcher {
    /// Create a new fetcher with default settings
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(requests_per_second: u32) -> Result<Self, FetchError> {
        Self::with_config(requests_per_second, 3, Duration::from_secs(30))
    }

    /// Create a new fetcher with custom configuration
    ///
    /// # Arguments
    ///
    /// * `requests_per_second` - Maximum number of requests per second
    /// * `max_retries` - Maximum number of retry attempts
    /// * `timeout` - Request timeout duration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_config(
        requests_per_second: u32,
        max_retries: u32,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        Self::build(
            requests_per_second,
            max_retries,
            timeout,
            1000,
            &format!("cubewatch/{}", env!("CARGO_PKG_VERSION")),
        )
    }

    /// Create a fetcher from the listing configuration section
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn from_config(config: &ListingConfig) -> Result<Self, FetchError> {
        Self::build(
            config.rate_limit,
            config.max_retries,
            Duration::from_secs(config.request_timeout_secs),
            config.retry_base_delay_ms,
            &config.user_agent,
        )
    }

    fn build(
        requests_per_second: u32,
        max_retries: u32,
        timeout: Duration,
        base_delay_ms: u64,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent)
            .default_headers(Self::default_headers())
            .build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rate);
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            max_retries,
            base_delay_ms,
        })
    }

    /// Override the backoff base delay (tests use a few milliseconds)
    #[must_use]
    pub fn with_base_delay(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Fetch a page body as text
    ///
    /// # Errors
    ///
    /// Returns various `FetchError` variants depending on the failure mode
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        self.fetch_with_retry(url).await
    }

    /// Fetch and deserialize a JSON document
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidPayload` if the body is not the expected JSON
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let body = self.fetch_text(url).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::InvalidPayload(e.to_string()))
    }

    /// Fetch with exponential backoff retry logic
    ///
    /// # Errors
    ///
    /// Returns `FetchError::MaxRetriesExceeded` if all retries fail
    async fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            // Apply exponential backoff for retries
            if attempt > 0 {
                let delay = self.base_delay_ms * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.text().await?);
                    } else if Self::should_retry(status.as_u16()) {
                        tracing::debug!(url = %url, status = %status, attempt, "Retryable status");
                        last_error = Some(FetchError::ServerError(status.as_u16()));
                        continue;
                    } else {
                        // Non-retryable error - return immediately
                        return Err(FetchError::ServerError(status.as_u16()));
                    }
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, attempt, "Request failed");
                    if e.is_timeout() {
                        last_error = Some(FetchError::Timeout);
                    } else {
                        last_error = Some(FetchError::Http(e));
                    }
                }
            }
        }

        if let Some(e) = last_error {
            tracing::warn!(url = %url, error = %e, retries = self.max_retries, "Giving up");
        }
        Err(FetchError::MaxRetriesExceeded)
    }

    /// Determine if a status code should trigger a retry
    ///
    /// Retry on 429, 500, 502, 503, 504. Other 4xx fail immediately.
    fn should_retry(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/json;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));
        headers
    }
}
