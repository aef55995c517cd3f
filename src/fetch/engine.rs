//! Fetch engine: the bounded retry loop
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 2xx | Success, no further attempts |
//! | Timeout | Retry after 2-5s |
//! | Connection failure | Retry after 3-7s |
//! | HTTP 429 | Retry after 10-20s |
//! | HTTP 401 / 403 | Immediate → Forbidden |
//! | Other HTTP status | Immediate → HttpError |
//! | Anything else | Retry after 1-3s |
//!
//! The ranges above are the defaults of [`DelayConfig`]. When the last
//! allowed attempt fails with a retryable condition the outcome is a failure
//! of that kind.

use crate::config::{DelayConfig, DelayRange, FetchConfig};
use crate::fetch::headers::HeaderProfile;
use crate::fetch::transport::{HttpTransport, RawResponse, Transport, TransportError};
use crate::url::validate_url;
use crate::UrlResult;
use rand::Rng;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use url::Url;

/// A validated, immutable fetch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: Url,
    max_retries: u32,
}

impl FetchRequest {
    pub const MIN_RETRIES: u32 = 1;
    pub const MAX_RETRIES: u32 = 5;

    /// Validates `url` and clamps `max_retries` into `[1, 5]`
    pub fn new(url: &str, max_retries: u32) -> UrlResult<Self> {
        Ok(Self {
            url: validate_url(url)?,
            max_retries: max_retries.clamp(Self::MIN_RETRIES, Self::MAX_RETRIES),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Terminal classification of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Timeout,
    ConnectionError,
    RateLimited,
    /// HTTP 401 or 403
    Forbidden,
    /// Any other non-success status
    HttpError(u16),
    Unknown,
}

impl FailureKind {
    /// Stable snake_case name used in reports and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionError => "connection_error",
            Self::RateLimited => "rate_limited",
            Self::Forbidden => "forbidden",
            Self::HttpError(_) => "http_error",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true if another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Forbidden | Self::HttpError(_))
    }

    /// The backoff tier slept before retrying after this failure
    pub fn backoff(&self, delays: &DelayConfig) -> Option<DelayRange> {
        match self {
            Self::Timeout => Some(delays.timeout),
            Self::ConnectionError => Some(delays.connection),
            Self::RateLimited => Some(delays.rate_limited),
            Self::Unknown => Some(delays.unexpected),
            Self::Forbidden | Self::HttpError(_) => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpError(status) => write!(f, "http_error({})", status),
            other => f.write_str(other.as_str()),
        }
    }
}

impl Serialize for FailureKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A terminal fetch failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    /// HTTP status of the last response, if one was received
    pub status_code: Option<u16>,
    /// Attempts made, including the failing one
    pub attempts: u32,
    /// Actionable, human readable explanation
    pub message: String,
}

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// A 2xx response was received
    Success {
        response: RawResponse,
        /// Attempts made, including the successful one
        attempts: u32,
    },

    /// All allowed attempts failed, or a non-retryable failure occurred
    Failure(FetchFailure),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } => *attempts,
            Self::Failure(failure) => failure.attempts,
        }
    }
}

/// Classification of one attempt
struct AttemptError {
    kind: FailureKind,
    status_code: Option<u16>,
    detail: String,
}

fn classify(result: Result<RawResponse, TransportError>) -> Result<RawResponse, AttemptError> {
    match result {
        Ok(response) if (200..300).contains(&response.status) => Ok(response),
        Ok(response) => {
            let status = response.status;
            let kind = match status {
                429 => FailureKind::RateLimited,
                401 | 403 => FailureKind::Forbidden,
                _ => FailureKind::HttpError(status),
            };
            Err(AttemptError {
                kind,
                status_code: Some(status),
                detail: format!("HTTP {}", status),
            })
        }
        Err(TransportError::Timeout(detail)) => Err(AttemptError {
            kind: FailureKind::Timeout,
            status_code: None,
            detail,
        }),
        Err(TransportError::Connect(detail)) => Err(AttemptError {
            kind: FailureKind::ConnectionError,
            status_code: None,
            detail,
        }),
        Err(other) => Err(AttemptError {
            kind: FailureKind::Unknown,
            status_code: None,
            detail: other.to_string(),
        }),
    }
}

fn failure_message(error: &AttemptError, attempts: u32) -> String {
    match error.kind {
        FailureKind::Timeout => format!(
            "Request timed out after {} attempt(s). The site may be slow or blocking automated requests.",
            attempts
        ),
        FailureKind::ConnectionError => format!(
            "Could not connect after {} attempt(s). Check that the site is up and the URL is correct.",
            attempts
        ),
        FailureKind::RateLimited => format!(
            "Rate limited by the site (HTTP 429) after {} attempt(s). Wait a few minutes before trying again.",
            attempts
        ),
        FailureKind::Forbidden => format!(
            "Access denied ({}). The site is blocking automated requests; retrying will not help.",
            error.detail
        ),
        FailureKind::HttpError(status) => format!(
            "The site responded with HTTP {}. Check that the URL points to an existing page.",
            status
        ),
        FailureKind::Unknown => format!(
            "Unexpected error after {} attempt(s): {}",
            attempts, error.detail
        ),
    }
}

/// Draws a delay uniformly from an inclusive millisecond range
pub fn draw_delay<R: Rng + ?Sized>(rng: &mut R, range: DelayRange) -> Duration {
    if range.max_ms <= range.min_ms {
        return Duration::from_millis(range.min_ms);
    }
    Duration::from_millis(rng.gen_range(range.min_ms..=range.max_ms))
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Issues fetch attempts through a [`Transport`] under the retry policy
#[derive(Debug, Clone)]
pub struct Fetcher<T = HttpTransport> {
    transport: T,
    config: FetchConfig,
}

impl Fetcher<HttpTransport> {
    /// Creates a fetcher that talks to the network
    pub fn from_config(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(HttpTransport::new(config)?, config.clone()))
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, config: FetchConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches a URL with full error handling and retry logic
    ///
    /// One header profile is generated for the whole attempt sequence and a
    /// single pre-request pause is taken before the first attempt. Each
    /// attempt restarts the request from scratch.
    pub async fn fetch<R: Rng + Send + ?Sized>(
        &self,
        request: &FetchRequest,
        rng: &mut R,
    ) -> FetchOutcome {
        let profile = HeaderProfile::generate(rng);
        let url = request.url();
        let max_attempts = request.max_retries();
        tracing::debug!("Using User-Agent: {}", profile.user_agent());

        pause(draw_delay(rng, self.config.delays.pre_request)).await;

        let mut attempt = 1;
        loop {
            tracing::info!("Attempt {}/{} for {}", attempt, max_attempts, url);

            let result = self
                .transport
                .get(url, &profile, self.config.timeout())
                .await;

            let error = match classify(result) {
                Ok(response) => {
                    tracing::info!(
                        "Fetched {} (HTTP {}) on attempt {}",
                        response.final_url,
                        response.status,
                        attempt
                    );
                    return FetchOutcome::Success {
                        response,
                        attempts: attempt,
                    };
                }
                Err(error) => error,
            };

            let backoff = error.kind.backoff(&self.config.delays);
            match backoff {
                Some(range) if attempt < max_attempts => {
                    let delay = draw_delay(rng, range);
                    tracing::warn!(
                        "{} on attempt {} for {} ({}), retrying in {}ms",
                        error.kind,
                        attempt,
                        url,
                        error.detail,
                        delay.as_millis()
                    );
                    pause(delay).await;
                    attempt += 1;
                }
                _ => {
                    let message = failure_message(&error, attempt);
                    tracing::error!("Giving up on {} after {} attempt(s): {}", url, attempt, message);
                    return FetchOutcome::Failure(FetchFailure {
                        kind: error.kind,
                        status_code: error.status_code,
                        attempts: attempt,
                        message,
                    });
                }
            }
        }
    }
}
