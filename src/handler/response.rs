//! Response emission

use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

/// How to call the endpoint, attached to every error body
pub const USAGE: &str = "Pass the page to analyze as ?url=https://example.com or in a JSON body \
{\"url\": \"https://example.com\"}. Optional: retries (1-5), user_id, project_id.";

const CORS_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
];

/// A gateway-style response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded body
    pub body: String,
}

impl ApiResponse {
    /// Builds a JSON response with the CORS headers
    pub fn json<B: Serialize + ?Sized>(status_code: u16, body: &B) -> Self {
        match serde_json::to_string(body) {
            Ok(body) => Self::with_body(status_code, body),
            Err(e) => {
                tracing::error!("Failed to serialize response body: {}", e);
                Self::with_body(
                    500,
                    json!({"error": format!("Failed to serialize response: {}", e), "usage": USAGE})
                        .to_string(),
                )
            }
        }
    }

    fn with_body(status_code: u16, body: String) -> Self {
        let mut headers: BTreeMap<String, String> = CORS_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Self {
            status_code,
            headers,
            body,
        }
    }

    /// 200 with the given body
    pub fn ok<B: Serialize + ?Sized>(body: &B) -> Self {
        Self::json(200, body)
    }

    /// 200 with an empty object, for CORS preflight
    pub fn preflight() -> Self {
        Self::with_body(200, "{}".to_string())
    }

    /// 400 with an error message and the usage hint
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::json(
            400,
            &json!({
                "success": false,
                "error": message.into(),
                "usage": USAGE,
            }),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Decodes the body back into JSON
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}
