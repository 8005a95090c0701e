//! HTTP client for historical-data pages.
//!
//! Wraps the remote source behind the [`PageSource`] trait, applies a
//! process-wide rate limit ahead of every request, and retries transient
//! failures with exponential backoff. A 429 response's Retry-After hint
//! takes precedence over the computed backoff.

use async_trait::async_trait;
use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use stock_track_core::RetrieverConfig;

use crate::error::{Result, RetrievalError};

/// One attempt against the remote source. Implementations map HTTP
/// outcomes onto [`RetrievalError`]; the retry loop lives above this seam.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Issues a single request for the symbol's history page.
    async fn get_page(&self, symbol: &str) -> Result<String>;
}

/// Retry budget and backoff schedule for transient failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (zero-based).
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }

    /// Delay to apply for a given transient error, honoring a
    /// Retry-After hint over the computed backoff.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &RetrievalError) -> Duration {
        match error.retry_after_secs() {
            Some(secs) => Duration::from_secs(secs),
            None => self.backoff_delay(attempt),
        }
    }
}

impl From<&RetrieverConfig> for RetryPolicy {
    fn from(config: &RetrieverConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_secs(config.retry_base_delay_secs),
        }
    }
}

/// Live [`PageSource`] backed by reqwest with a governor rate limiter.
pub struct HttpPageSource {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
}

impl HttpPageSource {
    /// Builds the HTTP transport from retriever configuration.
    ///
    /// # Errors
    /// Returns an error if the configured headers are malformed or the
    /// underlying client cannot be constructed.
    pub fn new(config: &RetrieverConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        for (name, value) in &config.headers {
            let name: reqwest::header::HeaderName = name
                .parse()
                .map_err(|e| RetrievalError::Configuration(format!("header name {name}: {e}")))?;
            let value: reqwest::header::HeaderValue = value
                .parse()
                .map_err(|e| RetrievalError::Configuration(format!("header {name} value: {e}")))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        let per_second = config.rate_limit_per_second.max(1);
        let quota = Quota::per_second(NonZeroU32::new(per_second).expect("Rate limit must be > 0"));

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get_page(&self, symbol: &str) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/{}/history", self.base_url, symbol);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok());
            return Err(RetrievalError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RetrievalError::status(status.as_u16(), message));
        }

        Ok(response.text().await?)
    }
}

/// Retrying fetch client for historical-data pages.
pub struct HistoryClient {
    source: Arc<dyn PageSource>,
    policy: RetryPolicy,
}

impl HistoryClient {
    /// Creates a client with the live HTTP transport.
    ///
    /// # Errors
    /// Returns an error if the HTTP transport cannot be constructed.
    pub fn new(config: &RetrieverConfig) -> Result<Self> {
        Ok(Self {
            source: Arc::new(HttpPageSource::new(config)?),
            policy: RetryPolicy::from(config),
        })
    }

    /// Creates a client over an arbitrary transport, used by tests.
    #[must_use]
    pub fn with_source(source: Arc<dyn PageSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Fetches a symbol's history page, retrying transient failures.
    ///
    /// Issues at most `max_retries` additional attempts with
    /// monotonically non-decreasing delays. Permanent failures return
    /// immediately; exhausted retries surface as
    /// [`RetrievalError::RetriesExhausted`].
    ///
    /// # Errors
    /// Returns the final classified error once retries are exhausted or a
    /// permanent failure occurs.
    pub async fn fetch_page(&self, symbol: &str) -> Result<String> {
        let mut attempt = 0u32;

        loop {
            match self.source.get_page(symbol).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt, &e);
                    warn!(
                        symbol,
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        error = %e,
                        "transient fetch failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(RetrievalError::RetriesExhausted {
                        attempts: attempt + 1,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted transport: pops one outcome per call.
    struct ScriptedSource {
        outcomes: Mutex<Vec<Result<String>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedSource {
        fn new(mut outcomes: Vec<Result<String>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn get_page(&self, _symbol: &str) -> Result<String> {
            *self.calls.lock().unwrap() += 1;
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .expect("scripted source ran out of outcomes")
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(5),
        }
    }

    fn rate_limited() -> RetrievalError {
        RetrievalError::RateLimited {
            retry_after_secs: None,
        }
    }

    // ==================== Backoff Schedule Tests ====================

    #[test]
    fn test_backoff_is_monotonically_non_decreasing() {
        let policy = policy();
        let mut previous = Duration::ZERO;
        for attempt in 0..6 {
            let delay = policy.backoff_delay(attempt);
            assert!(delay >= previous, "backoff shrank at attempt {attempt}");
            previous = delay;
        }
    }

    #[test]
    fn test_backoff_doubles_from_base() {
        let policy = policy();
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(5));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(10));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(20));
    }

    #[test]
    fn test_retry_after_hint_overrides_backoff() {
        let policy = policy();
        let hinted = RetrievalError::RateLimited {
            retry_after_secs: Some(42),
        };
        assert_eq!(policy.delay_for(0, &hinted), Duration::from_secs(42));
        assert_eq!(policy.delay_for(0, &rate_limited()), Duration::from_secs(5));
    }

    // ==================== Retry Loop Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_twice_then_success() {
        // Spec scenario: 429, 429, 200 succeeds on the third attempt.
        let source = Arc::new(ScriptedSource::new(vec![
            Err(rate_limited()),
            Err(rate_limited()),
            Ok("<html>prices</html>".to_string()),
        ]));
        let client = HistoryClient::with_source(source.clone(), policy());

        let body = client.fetch_page("AAPL").await.expect("third attempt succeeds");
        assert_eq!(body, "<html>prices</html>");
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let source = Arc::new(ScriptedSource::new(vec![Err(RetrievalError::status(
            404, "not found",
        ))]));
        let client = HistoryClient::with_source(source.clone(), policy());

        let err = client.fetch_page("NOPE").await.unwrap_err();
        assert!(matches!(err, RetrievalError::Status { status: 404, .. }));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_bound_attempts() {
        // max_retries = 3 means at most 4 total attempts.
        let source = Arc::new(ScriptedSource::new(vec![
            Err(RetrievalError::status(500, "a")),
            Err(RetrievalError::status(502, "b")),
            Err(RetrievalError::status(503, "c")),
            Err(RetrievalError::status(504, "d")),
        ]));
        let client = HistoryClient::with_source(source.clone(), policy());

        let err = client.fetch_page("AAPL").await.unwrap_err();
        match err {
            RetrievalError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 4);
                assert!(last_error.contains("504"));
            }
            other => panic!("expected exhaustion, got {other}"),
        }
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt_issues_one_call() {
        let source = Arc::new(ScriptedSource::new(vec![Ok("body".to_string())]));
        let client = HistoryClient::with_source(source.clone(), policy());

        client.fetch_page("AAPL").await.expect("success");
        assert_eq!(source.calls(), 1);
    }
}
