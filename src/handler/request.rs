//! Request intake
//!
//! Gateway-style events carry parameters in the query string, in a JSON
//! body, or both. Each field is looked up in the query string first; the
//! body is only decoded when the query string lacks a field, and a body that
//! does not decode to a JSON object is ignored.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::cell::OnceCell;
use std::collections::BTreeMap;
use thiserror::Error;

/// An incoming gateway event
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeEvent {
    #[serde(default)]
    pub http_method: Option<String>,

    #[serde(default)]
    pub query_string_parameters: Option<BTreeMap<String, String>>,

    /// JSON body, either as an encoded string or an inline object
    #[serde(default)]
    pub body: Option<Value>,
}

impl ScrapeEvent {
    /// Builds an event carrying only query string parameters
    pub fn from_query<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            query_string_parameters: Some(
                params
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// Builds an event carrying only a JSON body
    pub fn from_body(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    /// Returns true for a CORS preflight request
    pub fn is_preflight(&self) -> bool {
        self.http_method
            .as_deref()
            .map(|m| m.eq_ignore_ascii_case("OPTIONS"))
            .unwrap_or(false)
    }
}

/// Why an event could not be turned into a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Missing URL parameter")]
    MissingUrl,

    #[error("Invalid retries value '{0}': expected an integer")]
    InvalidRetries(String),
}

/// Parameters of one scrape request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub url: String,
    /// Requested attempt budget, clamped into `[1, 5]`
    pub retries: Option<u32>,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
}

impl ScrapeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Extracts the request parameters from an event
    ///
    /// The URL is only checked for presence here; validation happens in the
    /// pipeline so it is reported the same way for every entry point.
    pub fn from_event(event: &ScrapeEvent) -> Result<Self, RequestError> {
        let query = event.query_string_parameters.as_ref();
        let body: OnceCell<Map<String, Value>> = OnceCell::new();

        let lookup = |key: &str| -> Option<Value> {
            query
                .and_then(|q| q.get(key))
                .map(|v| Value::String(v.clone()))
                .or_else(|| {
                    body.get_or_init(|| parse_body(event.body.as_ref()))
                        .get(key)
                        .filter(|v| !v.is_null())
                        .cloned()
                })
        };

        let url = lookup("url")
            .and_then(|v| value_to_string(&v))
            .filter(|u| !u.trim().is_empty())
            .ok_or(RequestError::MissingUrl)?;

        let retries = lookup("retries").map(|v| parse_retries(&v)).transpose()?;

        Ok(Self {
            url,
            retries,
            user_id: lookup("user_id")
                .and_then(|v| value_to_string(&v))
                .filter(|s| !s.is_empty()),
            project_id: lookup("project_id")
                .and_then(|v| value_to_string(&v))
                .filter(|s| !s.is_empty()),
        })
    }
}

fn parse_body(body: Option<&Value>) -> Map<String, Value> {
    let decoded = match body {
        Some(Value::Object(map)) => return map.clone(),
        Some(Value::String(text)) if !text.trim().is_empty() => serde_json::from_str(text),
        _ => return Map::new(),
    };

    match decoded {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::debug!("Ignoring request body: not a JSON object");
            Map::new()
        }
        Err(e) => {
            tracing::debug!("Ignoring request body: {}", e);
            Map::new()
        }
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_retries(value: &Value) -> Result<u32, RequestError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed
        .map(|n| n.clamp(1, 5) as u32)
        .ok_or_else(|| RequestError::InvalidRetries(value.to_string()))
}
