//! Integration tests for Page-Lens
//!
//! These tests use wiremock to stand up local HTTP servers and drive the
//! pipeline and the handler end to end over real sockets.

mod handler_tests;
mod pipeline_tests;

use page_lens::config::{Config, DelayConfig, FetchConfig};

/// Configuration with backoff disabled and a short timeout
pub fn test_config() -> Config {
    Config {
        fetch: FetchConfig {
            timeout_secs: 1,
            delays: DelayConfig::none(),
            ..FetchConfig::default()
        },
        ..Config::default()
    }
}

/// An HTML page with a title and the given body markup
pub fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}
