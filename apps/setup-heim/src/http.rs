//! Shared HTTP plumbing for the release lookup and archive downloads.
//!
//! Retrying is a transport concern: callers issue one logical GET and get
//! back the final response (or the final transport error). Connection
//! failures, timeouts and the statuses listed in a [`RetryPolicy`] are
//! retried with exponential backoff; every other status is returned to the
//! caller untouched.

use std::time::Duration;

use rand::Rng;
use reqwest::{Client, Response, StatusCode};
use tracing::warn;

use crate::errors::{Result, SetupError};

/// User-Agent header for HTTP requests.
pub const USER_AGENT: &str = "setup-heim";

/// Timeout for the release lookup in seconds.
pub const LOOKUP_TIMEOUT_SECS: u64 = 30;

/// Timeout for an archive download in seconds.
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// How a request is retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles afterwards.
    pub base_delay: Duration,
    /// Response statuses that are worth another attempt.
    pub retry_statuses: &'static [u16],
}

impl RetryPolicy {
    /// Policy for JSON lookups: gateway and availability errors only.
    #[must_use]
    pub const fn lookup() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            retry_statuses: &[502, 503, 504],
        }
    }

    /// Policy for archive downloads: also backs off on rate limiting.
    #[must_use]
    pub const fn download() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            retry_statuses: &[429, 500, 502, 503, 504],
        }
    }

    /// Same policy with a different base delay.
    #[cfg(test)]
    #[must_use]
    pub const fn with_base_delay(self, base_delay: Duration) -> Self {
        Self { base_delay, ..self }
    }

    fn should_retry_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }

    /// Calculates the delay before `attempt` (1-based retry count).
    ///
    /// The delay doubles with each attempt with +/- 25% jitter.
    fn delay(&self, attempt: u32) -> Duration {
        #[allow(clippy::cast_possible_truncation)]
        let base_ms = self.base_delay.as_millis() as u64;
        let base = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let jitter_range = base / 4;
        let jitter = rand::rng().random_range(0..=jitter_range * 2);
        Duration::from_millis(base - jitter_range + jitter)
    }
}

/// Builds a client with the crate's user agent and the given timeout.
///
/// # Errors
///
/// Returns [`SetupError::HttpClient`] if the TLS backend cannot be initialised.
pub fn client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|source| SetupError::HttpClient { source })
}

/// Sends a GET request, retrying according to `policy`.
///
/// The returned response may still carry a non-success status; the caller
/// decides what that means.
///
/// # Errors
///
/// Returns [`SetupError::Transport`] when the last attempt produced no response.
pub async fn get_with_retries(
    client: &Client,
    url: &str,
    accept: Option<&str>,
    policy: RetryPolicy,
) -> Result<Response> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut request = client.get(url);
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }
        let last_attempt = attempt >= policy.max_attempts;

        match request.send().await {
            Ok(response) if !last_attempt && policy.should_retry_status(response.status()) => {
                warn!(
                    "{url} answered {}, retrying (attempt {}/{})",
                    response.status(),
                    attempt + 1,
                    policy.max_attempts
                );
            }
            Ok(response) => return Ok(response),
            Err(e) if !last_attempt && (e.is_connect() || e.is_timeout()) => {
                warn!(
                    "request to {url} failed: {e}, retrying (attempt {}/{})",
                    attempt + 1,
                    policy.max_attempts
                );
            }
            Err(source) => {
                return Err(SetupError::Transport {
                    url: url.to_string(),
                    source,
                });
            }
        }

        tokio::time::sleep(policy.delay(attempt)).await;
    }
}
