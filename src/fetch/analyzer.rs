//! Transport-level response analysis
//!
//! Everything here is derived from the status line, headers, redirect chain
//! and timing of a [`RawResponse`]; the body is only consulted for its byte
//! length when no `Content-Length` header is present.

use crate::fetch::decode::content_codings;
use crate::fetch::transport::RawResponse;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use serde::Serialize;
use std::collections::BTreeMap;

/// General response headers copied into the report
pub const RESPONSE_HEADERS: &[&str] = &[
    "server",
    "date",
    "last-modified",
    "etag",
    "cache-control",
    "expires",
    "content-encoding",
    "transfer-encoding",
    "connection",
    "keep-alive",
];

/// Security headers copied into the report
pub const SECURITY_HEADERS: &[&str] = &[
    "x-frame-options",
    "x-content-type-options",
    "x-xss-protection",
    "strict-transport-security",
    "content-security-policy",
    "referrer-policy",
];

const COMPRESSED_ENCODINGS: &[&str] = &["gzip", "deflate", "br"];
const CACHE_HEADERS: &[&str] = &["cache-control", "expires", "last-modified"];

/// Transport report for a successful fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportReport {
    pub status_code: u16,
    /// Lowercased Content-Type, empty when absent
    pub content_type: String,
    pub content_length: u64,
    /// Charset declared in Content-Type
    pub encoding: Option<String>,
    pub final_url: String,
    pub redirected: bool,
    pub redirect_count: usize,
    pub redirect_chain: Vec<String>,
    pub response_time_ms: u64,
    pub headers: BTreeMap<String, String>,
    pub security_headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub is_compressed: bool,
    pub is_chunked: bool,
    pub has_cache_headers: bool,
}

/// Builds the transport report of a completed response
pub fn analyze_response(response: &RawResponse) -> TransportReport {
    let content_type = header_str(&response.headers, CONTENT_TYPE.as_str())
        .map(|ct| ct.to_lowercase())
        .unwrap_or_default();

    let content_length = header_str(&response.headers, CONTENT_LENGTH.as_str())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(response.body.len() as u64);

    let headers = select_headers(&response.headers, RESPONSE_HEADERS);
    let security_headers = select_headers(&response.headers, SECURITY_HEADERS);

    let is_compressed = content_codings(&response.headers)
        .iter()
        .any(|coding| COMPRESSED_ENCODINGS.contains(&coding.as_str()));

    let is_chunked = headers
        .get("transfer-encoding")
        .map(|te| te.trim().eq_ignore_ascii_case("chunked"))
        .unwrap_or(false);

    let has_cache_headers = CACHE_HEADERS.iter().any(|h| headers.contains_key(*h));

    TransportReport {
        status_code: response.status,
        encoding: declared_charset(&content_type),
        content_type,
        content_length,
        final_url: response.final_url.to_string(),
        redirected: !response.redirect_chain.is_empty(),
        redirect_count: response.redirect_chain.len(),
        redirect_chain: response.redirect_chain.clone(),
        response_time_ms: response.elapsed.as_millis() as u64,
        headers,
        security_headers,
        cookies: response.cookies.clone(),
        is_compressed,
        is_chunked,
        has_cache_headers,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn select_headers(headers: &HeaderMap, names: &[&str]) -> BTreeMap<String, String> {
    names
        .iter()
        .filter_map(|&name| header_str(headers, name).map(|v| (name.to_string(), v.to_string())))
        .collect()
}

/// Extracts the `charset` parameter of a (lowercased) content type
fn declared_charset(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim() == "charset" {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}
