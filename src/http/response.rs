//! Raw transport responses and body decoding.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

/// A response as returned by a [`Transport`](crate::http::Transport).
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Create an empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Add a header. Names must be lowercase.
    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers
            .insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        self
    }

    /// Set a JSON body and the matching content type.
    pub fn with_json(mut self, value: &Value) -> Self {
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = value.to_string().into_bytes();
        self
    }

    /// Set a plain text body.
    pub fn with_text(mut self, text: &str) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        self.body = text.as_bytes().to_vec();
        self
    }

    /// Header value as a string, if present and valid.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn decode_body(&self) -> ResponseBody {
        ResponseBody::decode(&self.headers, &self.body)
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Decode as JSON when the content type says so, otherwise as text.
    pub fn decode(headers: &HeaderMap, body: &[u8]) -> Self {
        let is_json = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            match serde_json::from_slice(body) {
                Ok(value) => return ResponseBody::Json(value),
                Err(e) => {
                    tracing::warn!(error = %e, "Response declared JSON but failed to parse");
                }
            }
        }

        ResponseBody::Text(String::from_utf8_lossy(body).into_owned())
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// Human-readable summary: the API's `message` field, or the raw text.
    pub fn message(&self) -> String {
        match self {
            ResponseBody::Json(value) => value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
            ResponseBody::Text(text) => text.clone(),
        }
    }
}
