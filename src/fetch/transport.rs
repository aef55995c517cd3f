//! HTTP transport
//!
//! This module performs the network exchange of a single fetch attempt:
//! - Building the shared HTTP client
//! - Following redirects manually so the chain can be reported
//! - Capturing status, headers, cookies, timing and body
//! - Classifying client errors into timeouts, connection failures and the rest

use crate::config::FetchConfig;
use crate::fetch::decode::decode_body;
use crate::fetch::headers::HeaderProfile;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, LOCATION, SET_COOKIE};
use reqwest::{redirect::Policy, Client};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Everything captured from one completed HTTP exchange
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code of the final response
    pub status: u16,
    /// URL after all redirects
    pub final_url: Url,
    /// URLs that answered with a redirect, in the order they were visited
    pub redirect_chain: Vec<String>,
    /// Wall-clock time of the whole exchange, redirects included
    pub elapsed: Duration,
    /// Headers of the final response, as sent by the server
    pub headers: HeaderMap,
    /// Cookies set by the final response (name -> value)
    pub cookies: BTreeMap<String, String>,
    /// Decoded response body
    pub body: String,
}

/// Failure of a single attempt, before retry policy is applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Too many redirects (more than {0})")]
    TooManyRedirects(usize),

    #[error("Invalid redirect location '{0}'")]
    BadRedirect(String),

    #[error("Failed to decode response body: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// The network seam of the fetch engine
///
/// One call is one attempt: a GET for `url` with the given headers that
/// either completes (any status code) or fails as a whole within `timeout`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &Url,
        headers: &HeaderProfile,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

/// Builds the HTTP client used by [`HttpTransport`]
///
/// Redirects are disabled on the client and followed by the transport so
/// that every hop is recorded. Automatic decompression is off so content
/// coding headers survive; bodies are decoded by the transport. Certificate
/// validation stays on.
///
/// # Example
///
/// ```no_run
/// use page_lens::config::FetchConfig;
/// use page_lens::fetch::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout())
        .connect_timeout(config.timeout().min(Duration::from_secs(10)))
        .redirect(Policy::none())
        .no_gzip()
        .no_brotli()
        .no_deflate()
        .build()
}

/// Real network transport backed by reqwest
///
/// The underlying client pools connections and is safe to share between
/// concurrent pipeline runs.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    max_redirects: usize,
}

impl HttpTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            max_redirects: config.max_redirects,
        })
    }

    /// Performs the request and follows redirects up to `max_redirects` hops
    async fn exchange(
        &self,
        url: &Url,
        headers: &HeaderProfile,
    ) -> Result<RawResponse, TransportError> {
        let started = Instant::now();
        let header_map = headers.to_header_map();
        let mut current = url.clone();
        let mut chain: Vec<String> = Vec::new();

        loop {
            let response = self
                .client
                .get(current.clone())
                .headers(header_map.clone())
                .send()
                .await?;

            let status = response.status();
            if status.is_redirection() {
                if let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                {
                    if chain.len() >= self.max_redirects {
                        return Err(TransportError::TooManyRedirects(self.max_redirects));
                    }

                    let next = current
                        .join(location)
                        .map_err(|_| TransportError::BadRedirect(location.to_string()))?;
                    tracing::debug!("Redirect {} -> {} ({})", current, next, status);
                    chain.push(current.to_string());
                    current = next;
                    continue;
                }

                tracing::warn!(
                    "Redirect status {} for {} but no Location header",
                    status,
                    current
                );
            }

            let headers = response.headers().clone();
            let cookies = parse_cookies(&headers);
            let raw_body = response.bytes().await?;
            let body = decode_body(&headers, &raw_body)
                .map_err(|e| TransportError::Decode(e.to_string()))?;

            return Ok(RawResponse {
                status: status.as_u16(),
                final_url: current,
                redirect_chain: chain,
                elapsed: started.elapsed(),
                headers,
                cookies,
                body,
            });
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &Url,
        headers: &HeaderProfile,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        match tokio::time::timeout(timeout, self.exchange(url, headers)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(format!(
                "no complete response within {}s",
                timeout.as_secs()
            ))),
        }
    }
}

/// Collects `name=value` pairs from every `Set-Cookie` header
///
/// Attributes after the first `;` are ignored. A cookie set twice keeps the
/// last value.
pub fn parse_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|raw| {
            let pair = raw.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
