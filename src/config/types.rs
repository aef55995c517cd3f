use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Page-Lens
///
/// Every section and field has a default, so an empty file (or no file at
/// all) yields the production settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub storage: StorageConfig,
}

/// Fetch engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-attempt request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Maximum number of redirect hops followed within one attempt
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Attempts used when the caller does not ask for a specific number
    #[serde(rename = "default-retries")]
    pub default_retries: u32,

    /// Fixed rng seed; when absent every run draws from OS entropy
    pub seed: Option<u64>,

    /// Backoff tiers
    pub delays: DelayConfig,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_redirects: 10,
            default_retries: 3,
            seed: None,
            delays: DelayConfig::default(),
        }
    }
}

/// An inclusive `[min, max]` delay range in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u64; 2]")]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn from_secs(min: u64, max: u64) -> Self {
        Self::from_millis(min * 1000, max * 1000)
    }

    /// A range that never sleeps
    pub const fn zero() -> Self {
        Self::from_millis(0, 0)
    }
}

impl From<[u64; 2]> for DelayRange {
    fn from(pair: [u64; 2]) -> Self {
        Self::from_millis(pair[0], pair[1])
    }
}

/// Delay ranges for the pre-request pause and each backoff tier
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Human-like pause before the first attempt
    #[serde(rename = "pre-request")]
    pub pre_request: DelayRange,

    pub timeout: DelayRange,

    pub connection: DelayRange,

    #[serde(rename = "rate-limited")]
    pub rate_limited: DelayRange,

    /// Unexpected errors that are neither timeouts nor connection failures
    pub unexpected: DelayRange,
}

impl DelayConfig {
    /// All delays disabled
    pub fn none() -> Self {
        Self {
            pre_request: DelayRange::zero(),
            timeout: DelayRange::zero(),
            connection: DelayRange::zero(),
            rate_limited: DelayRange::zero(),
            unexpected: DelayRange::zero(),
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            pre_request: DelayRange::from_secs(1, 3),
            timeout: DelayRange::from_secs(2, 5),
            connection: DelayRange::from_secs(3, 7),
            rate_limited: DelayRange::from_secs(10, 20),
            unexpected: DelayRange::from_secs(1, 3),
        }
    }
}

/// Caps applied by the HTML extractor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Maximum characters of page text kept in `content`
    #[serde(rename = "content-limit")]
    pub content_limit: usize,

    #[serde(rename = "link-limit")]
    pub link_limit: usize,

    #[serde(rename = "image-limit")]
    pub image_limit: usize,

    #[serde(rename = "script-limit")]
    pub script_limit: usize,

    #[serde(rename = "stylesheet-limit")]
    pub stylesheet_limit: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            content_limit: 2000,
            link_limit: 15,
            image_limit: 10,
            script_limit: 10,
            stylesheet_limit: 10,
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Whether scrape results are saved
    pub enabled: bool,

    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            database_path: "./page-lens.db".to_string(),
        }
    }
}
