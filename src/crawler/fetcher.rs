//! HTTP fetcher with retry and exponential backoff
//!
//! This module handles all per-item HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent
//! - Classifying each attempt as success, retryable or fatal
//! - Sleeping `initial_delay * backoff_factor^attempt` between attempts
//! - Giving up after a fixed number of attempts with an explicit failure marker
//!
//! The fetcher never returns an error to its caller and never persists anything.

use crate::config::{HttpConfig, RetryConfig};
use reqwest::Client;
use std::time::Duration;

/// Retry tuning for one crawl type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff_factor,
        }
    }

    /// Delay slept after failed attempt number `attempt` (starting at 1)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_delay_ms),
            config.backoff_factor,
        )
    }
}

/// Fully describes one network call
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub timeout: Duration,
    /// Treat a 2xx response with an empty body as a failed attempt
    pub require_body: bool,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            require_body: false,
        }
    }

    pub fn require_body(mut self) -> Self {
        self.require_body = true;
        self
    }
}

/// Classification of a single attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    Success { status: u16, body: Vec<u8> },

    /// Timeout, connection error, non-success status or empty body
    Retryable(String),

    /// The request itself is malformed; retrying cannot help
    Fatal(String),
}

/// Result of a fetch after all retries
#[derive(Debug)]
pub enum FetchOutcome {
    Success {
        status: u16,
        body: Vec<u8>,
        /// Attempts used, including the successful one
        attempts: u32,
    },

    /// All attempts failed, or one failed fatally
    Failed { attempts: u32, reason: String },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }

    /// Returns the body on success, `None` on failure
    pub fn into_body(self) -> Option<Vec<u8>> {
        match self {
            Self::Success { body, .. } => Some(body),
            Self::Failed { .. } => None,
        }
    }
}

/// Builds an HTTP client with the configured user agent
///
/// Timeouts are applied per request, see [`FetchRequest::timeout`].
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs a single attempt and classifies the result
pub async fn attempt_once(client: &Client, request: &FetchRequest) -> AttemptOutcome {
    let response = match client
        .get(&request.url)
        .timeout(request.timeout)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) if e.is_builder() => return AttemptOutcome::Fatal(e.to_string()),
        Err(e) if e.is_timeout() => return AttemptOutcome::Retryable("request timeout".to_string()),
        Err(e) if e.is_connect() => {
            return AttemptOutcome::Retryable(format!("connection error: {}", e))
        }
        Err(e) => return AttemptOutcome::Retryable(e.to_string()),
    };

    let status = response.status();
    if !status.is_success() {
        return AttemptOutcome::Retryable(format!("HTTP {}", status.as_u16()));
    }

    match response.bytes().await {
        Ok(bytes) if request.require_body && bytes.is_empty() => {
            AttemptOutcome::Retryable(format!("HTTP {} with empty body", status.as_u16()))
        }
        Ok(bytes) => AttemptOutcome::Success {
            status: status.as_u16(),
            body: bytes.to_vec(),
        },
        Err(e) => AttemptOutcome::Retryable(format!("body read failed: {}", e)),
    }
}

/// Fetcher that retries transient failures with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Fetches `request`, retrying up to `max_attempts` times in total
    ///
    /// No sleep follows the final attempt, and no request is made after it.
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        let mut attempt = 0;
        let mut last_reason = String::new();

        while attempt < self.policy.max_attempts {
            attempt += 1;

            match attempt_once(&self.client, request).await {
                AttemptOutcome::Success { status, body } => {
                    return FetchOutcome::Success {
                        status,
                        body,
                        attempts: attempt,
                    };
                }
                AttemptOutcome::Fatal(reason) => {
                    tracing::warn!("{}: not retrying ({})", request.url, reason);
                    return FetchOutcome::Failed {
                        attempts: attempt,
                        reason,
                    };
                }
                AttemptOutcome::Retryable(reason) => {
                    if attempt < self.policy.max_attempts {
                        let delay = self.policy.delay_for(attempt);
                        tracing::warn!(
                            "{}: {} (retry {} after {:.1}s)",
                            request.url,
                            reason,
                            attempt,
                            delay.as_secs_f64()
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_reason = reason;
                }
            }
        }

        tracing::warn!(
            "{}: failed after {} attempts ({})",
            request.url,
            attempt,
            last_reason
        );
        FetchOutcome::Failed {
            attempts: attempt,
            reason: last_reason,
        }
    }
}
