//! Response body decoding
//!
//! The HTTP client is built without automatic decompression so the
//! `Content-Encoding` and `Content-Length` headers reach the analyzer exactly
//! as the server sent them. The body is decoded here instead.

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use reqwest::header::{HeaderMap, CONTENT_ENCODING};
use std::io::{self, Read};

const BROTLI_BUFFER_SIZE: usize = 4096;

/// Content codings listed in `Content-Encoding`, in the order they were applied
pub fn content_codings(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(CONTENT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|coding| coding.trim().to_lowercase())
        .filter(|coding| !coding.is_empty())
        .collect()
}

/// Undoes every content coding of `body` and returns the text
///
/// Codings are removed last-applied first. Unknown codings (and `identity`)
/// pass the bytes through unchanged. The text is decoded as UTF-8, replacing
/// invalid sequences.
pub fn decode_body(headers: &HeaderMap, body: &[u8]) -> io::Result<String> {
    let mut bytes = body.to_vec();

    if !bytes.is_empty() {
        for coding in content_codings(headers).iter().rev() {
            bytes = decode_coding(coding, &bytes)?;
        }
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn decode_coding(coding: &str, bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();

    match coding {
        "gzip" | "x-gzip" => {
            GzDecoder::new(bytes).read_to_end(&mut out)?;
        }
        "deflate" => {
            // Servers disagree on whether "deflate" carries the zlib wrapper
            if ZlibDecoder::new(bytes).read_to_end(&mut out).is_err() {
                out.clear();
                DeflateDecoder::new(bytes).read_to_end(&mut out)?;
            }
        }
        "br" => {
            brotli::Decompressor::new(bytes, BROTLI_BUFFER_SIZE).read_to_end(&mut out)?;
        }
        other => {
            tracing::debug!("Leaving body with content coding '{}' as is", other);
            out.extend_from_slice(bytes);
        }
    }

    Ok(out)
}
