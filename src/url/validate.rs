use crate::UrlError;
use url::Url;

/// Validates a caller-supplied URL before anything touches the network
///
/// The URL must parse as an absolute URL, use the `http` or `https` scheme,
/// and carry a non-empty host. Surrounding whitespace is ignored.
///
/// # Arguments
///
/// * `url_str` - The URL as received from the caller
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(UrlError)` - The URL is empty, unparseable, or not fetchable
///
/// # Examples
///
/// ```
/// use page_lens::url::validate_url;
///
/// assert!(validate_url("https://example.com/page").is_ok());
/// assert!(validate_url("ftp://example.com/file").is_err());
/// assert!(validate_url("example.com").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlError> {
    let url_str = url_str.trim();
    if url_str.is_empty() {
        return Err(UrlError::Missing);
    }

    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost),
    }
}
