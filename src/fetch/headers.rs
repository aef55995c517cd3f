//! Browser-like request header profiles
//!
//! Sites that fingerprint bots look at more than the User-Agent, so a
//! profile carries the whole set of headers a desktop browser sends on a
//! top-level navigation.

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

/// Desktop browser User-Agent strings a profile is drawn from
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// Headers sent with every profile, in browser order after the User-Agent.
/// Names are lowercase so they can be used with `HeaderName::from_static`.
const STATIC_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.9"),
    ("accept-encoding", "gzip, deflate, br"),
    ("dnt", "1"),
    ("connection", "keep-alive"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    (
        "sec-ch-ua",
        "\"Chromium\";v=\"124\", \"Google Chrome\";v=\"124\", \"Not-A.Brand\";v=\"99\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("cache-control", "max-age=0"),
];

/// A complete set of request headers for one attempt sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderProfile {
    headers: Vec<(&'static str, &'static str)>,
}

impl HeaderProfile {
    /// Generates a profile with a User-Agent chosen uniformly from [`USER_AGENTS`]
    ///
    /// ```
    /// use page_lens::fetch::HeaderProfile;
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let profile = HeaderProfile::generate(&mut rng);
    /// assert!(profile.user_agent().starts_with("Mozilla/5.0"));
    /// assert_eq!(profile.get("dnt"), Some("1"));
    /// ```
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let user_agent = USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())];

        let mut headers = Vec::with_capacity(STATIC_HEADERS.len() + 1);
        headers.push(("user-agent", user_agent));
        headers.extend_from_slice(STATIC_HEADERS);

        Self { headers }
    }

    /// The User-Agent of this profile
    pub fn user_agent(&self) -> &'static str {
        self.get("user-agent").unwrap_or_default()
    }

    /// Looks up a header value by (case-insensitive) name
    pub fn get(&self, name: &str) -> Option<&'static str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.headers.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Converts the profile into a reqwest header map
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for &(name, value) in &self.headers {
            map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }
}
