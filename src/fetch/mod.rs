//! Fetch module: getting one page off the network
//!
//! This module contains:
//! - Browser-like header profile generation
//! - The HTTP transport (redirect tracking, cookie capture, timing)
//! - Content coding removal (gzip, deflate, brotli)
//! - The retry/backoff engine and its failure taxonomy
//! - Transport-level response analysis

mod analyzer;
mod decode;
mod engine;
mod headers;
mod transport;

pub use analyzer::{analyze_response, TransportReport, RESPONSE_HEADERS, SECURITY_HEADERS};
pub use decode::{content_codings, decode_body};
pub use engine::{draw_delay, FailureKind, FetchFailure, FetchOutcome, FetchRequest, Fetcher};
pub use headers::{HeaderProfile, USER_AGENTS};
pub use transport::{
    build_http_client, parse_cookies, HttpTransport, RawResponse, Transport, TransportError,
};
