//! Dispatcher error taxonomy.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

use crate::http::response::ResponseBody;
use crate::http::transport::TransportError;
use crate::routing::RouteError;

/// A non-successful response, kept for the caller to log or display.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpFailure {
    /// Status code returned by the API.
    pub status: StatusCode,
    /// Decoded response body.
    pub body: ResponseBody,
}

impl HttpFailure {
    pub fn new(status: StatusCode, body: ResponseBody) -> Self {
        Self { status, body }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.body.message();
        if message.is_empty() {
            write!(f, "{}", self.status)
        } else {
            write!(f, "{} ({})", self.status, message)
        }
    }
}

/// Fatal failure classes produced by response classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    Forbidden,
    NotFound,
    ServerError,
    /// A 429 that did not pass through the platform's edge proxy.
    RateLimited,
    Http,
}

/// Errors surfaced to callers of the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// 403 Forbidden.
    #[error("Forbidden: {0}")]
    Forbidden(HttpFailure),

    /// 404 Not Found.
    #[error("Not found: {0}")]
    NotFound(HttpFailure),

    /// 503, or retries exhausted on a 5xx.
    #[error("Server error: {0}")]
    ServerError(HttpFailure),

    /// 429 without the proxy marker. Signals misconfiguration, never retried.
    #[error("Unexpected rate limit response: {0}")]
    RateLimited(HttpFailure),

    /// Any other non-2xx status.
    #[error("HTTP error: {0}")]
    Http(HttpFailure),

    /// Network failure that could not be recovered by retrying.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The route could not be resolved.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Request headers or body could not be built.
    #[error("Invalid request: {0}")]
    Request(String),

    /// A file payload could not be rewound or read.
    #[error("File payload error: {0}")]
    File(#[from] std::io::Error),
}

/// Result type for dispatcher operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    /// Build the error matching a fatal classification.
    pub fn from_kind(kind: FatalKind, failure: HttpFailure) -> Self {
        match kind {
            FatalKind::Forbidden => DispatchError::Forbidden(failure),
            FatalKind::NotFound => DispatchError::NotFound(failure),
            FatalKind::ServerError => DispatchError::ServerError(failure),
            FatalKind::RateLimited => DispatchError::RateLimited(failure),
            FatalKind::Http => DispatchError::Http(failure),
        }
    }

    /// The response behind this error, if one was received.
    pub fn failure(&self) -> Option<&HttpFailure> {
        match self {
            DispatchError::Forbidden(f)
            | DispatchError::NotFound(f)
            | DispatchError::ServerError(f)
            | DispatchError::RateLimited(f)
            | DispatchError::Http(f) => Some(f),
            _ => None,
        }
    }

    /// Status code of the failed response, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.failure().map(|f| f.status)
    }
}
