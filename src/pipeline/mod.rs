//! Pipeline orchestration
//!
//! A run validates the URL, fetches it under the retry policy, then runs the
//! transport analyzer and the content extractor over the same response and
//! merges their reports. Failures short-circuit with an actionable message.

use crate::config::{Config, ExtractConfig};
use crate::extract::{extract_page, ExtractionResult};
use crate::fetch::{
    analyze_response, FailureKind, FetchFailure, FetchOutcome, FetchRequest, Fetcher,
    HttpTransport, Transport, TransportReport,
};
use crate::UrlError;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Version tag stamped on every report
pub const PIPELINE_VERSION: &str = concat!("page-lens/", env!("CARGO_PKG_VERSION"));

/// Capabilities that were active while producing a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureFlags {
    pub header_rotation: bool,
    pub tiered_backoff: bool,
    pub redirect_tracking: bool,
    pub security_analysis: bool,
    pub framework_detection: bool,
}

impl FeatureFlags {
    const ALL: Self = Self {
        header_rotation: true,
        tiered_backoff: true,
        redirect_tracking: true,
        security_analysis: true,
        framework_detection: true,
    };
}

/// Provenance of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMetadata {
    /// URL as requested, after validation
    pub url: String,
    /// RFC 3339 capture time
    pub captured_at: String,
    /// Capture time in unix seconds
    pub timestamp: i64,
    pub version: &'static str,
    pub attempts: u32,
    pub features: FeatureFlags,
}

impl ReportMetadata {
    fn new(url: &Url, attempts: u32, now: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            captured_at: now.to_rfc3339(),
            timestamp: now.timestamp(),
            version: PIPELINE_VERSION,
            attempts,
            features: FeatureFlags::ALL,
        }
    }
}

/// Merged result of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeReport {
    pub metadata: ReportMetadata,
    pub transport: TransportReport,
    pub content: ExtractionResult,
}

/// Terminal failure of a run, ready to be shown to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub url: String,
    pub kind: FailureKind,
    pub status_code: Option<u16>,
    pub message: String,
    pub attempts: u32,
    pub timestamp: String,
}

impl FailureReport {
    fn new(url: &Url, failure: FetchFailure) -> Self {
        Self {
            url: url.to_string(),
            kind: failure.kind,
            status_code: failure.status_code,
            message: failure.message,
            attempts: failure.attempts,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Why a run produced no report
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The URL was rejected before any network I/O
    #[error("Invalid URL: {0}")]
    Validation(#[from] UrlError),

    #[error("Fetch failed: {}", .0.message)]
    Fetch(FailureReport),
}

/// Fetch-and-extract pipeline
///
/// Holds only immutable configuration and the transport, so one pipeline can
/// serve concurrent runs. Every run draws from its own rng.
#[derive(Debug)]
pub struct Pipeline<T = HttpTransport> {
    fetcher: Fetcher<T>,
    extract: ExtractConfig,
}

impl Pipeline<HttpTransport> {
    /// Builds a networked pipeline from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            Fetcher::from_config(&config.fetch)?,
            config.extract.clone(),
        ))
    }
}

impl<T: Transport> Pipeline<T> {
    pub fn new(fetcher: Fetcher<T>, extract: ExtractConfig) -> Self {
        Self { fetcher, extract }
    }

    pub fn fetcher(&self) -> &Fetcher<T> {
        &self.fetcher
    }

    /// Attempts used when the caller does not ask for a specific count
    pub fn default_retries(&self) -> u32 {
        self.fetcher.config().default_retries
    }

    fn rng(&self) -> StdRng {
        match self.fetcher.config().seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Runs the pipeline for one URL
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch; must be absolute http(s)
    /// * `max_retries` - Total attempt budget, clamped into `[1, 5]`
    ///
    /// # Returns
    ///
    /// * `Ok(ScrapeReport)` - Transport and content reports of the page
    /// * `Err(PipelineError::Validation)` - The URL was rejected, nothing was sent
    /// * `Err(PipelineError::Fetch)` - Every allowed attempt failed
    pub async fn run(&self, url: &str, max_retries: u32) -> Result<ScrapeReport, PipelineError> {
        let request = FetchRequest::new(url, max_retries)?;
        let mut rng = self.rng();

        match self.fetcher.fetch(&request, &mut rng).await {
            FetchOutcome::Success { response, attempts } => {
                let transport = analyze_response(&response);
                let content = extract_page(&response.body, &response.final_url, &self.extract);

                Ok(ScrapeReport {
                    metadata: ReportMetadata::new(request.url(), attempts, Utc::now()),
                    transport,
                    content,
                })
            }
            FetchOutcome::Failure(failure) => {
                Err(PipelineError::Fetch(FailureReport::new(request.url(), failure)))
            }
        }
    }
}
