//! Page-Lens: a single-URL fetch-and-extract pipeline
//!
//! This crate fetches one web page per request, retrying transient failures
//! with tiered backoff and a browser-like header profile, then reports the
//! transport metadata and the structured content signals of the page.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod handler;
pub mod pipeline;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Page-Lens operations
#[derive(Debug, Error)]
pub enum LensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL validation errors
///
/// These are precondition violations: they are reported before any network
/// I/O happens and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Missing URL parameter")]
    Missing,

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Page-Lens operations
pub type Result<T> = std::result::Result<T, LensError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{extract_page, ExtractionResult};
pub use fetch::{FailureKind, FetchOutcome, FetchRequest, Fetcher, HeaderProfile};
pub use pipeline::{FailureReport, Pipeline, PipelineError, ScrapeReport};
pub use url::validate_url;
