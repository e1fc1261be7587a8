//! The rate-limited request dispatcher.
//!
//! # Call Flow
//! ```text
//! request(route, options)
//!     → wait for the global gate
//!     → acquire the bucket lock
//!     → loop:
//!         wait for the global gate
//!         rewind file payloads, build body
//!         send
//!         exhausted bucket? → defer the unlock until reset
//!         classify → Success | RetryAfter | Backoff | Fatal
//!     → last 500/502 → ServerError
//!     → bucket guard dropped (released now or on its timer)
//! ```

use std::time::{Duration, Instant as StdInstant};

use reqwest::StatusCode;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::DispatcherConfig;
use crate::dispatch::outcome::{classify, Outcome};
use crate::error::{DispatchError, DispatchResult, FatalKind, HttpFailure};
use crate::http::request::build_headers;
use crate::http::{
    Credentials, FilePayload, OutgoingRequest, RawResponse, RequestBody, RequestOptions,
    ReqwestTransport, ResponseBody, Transport, TransportError,
};
use crate::observability::metrics;
use crate::ratelimit::headers::{bucket_hash, is_exhausted, reset_delay};
use crate::ratelimit::{BucketGuard, BucketLocks, GlobalGate};
use crate::resilience::RetryPolicy;
use crate::routing::Route;

/// Sends API requests while honouring per-bucket and global rate limits.
///
/// One dispatcher should be shared (by reference or `Arc`) by every caller
/// talking to the same account, since it owns the bucket locks and the
/// global gate.
#[derive(Debug)]
pub struct Dispatcher<T = ReqwestTransport> {
    transport: T,
    locks: BucketLocks,
    gate: GlobalGate,
    credentials: Credentials,
    user_agent: String,
    api_base: String,
    use_clock: bool,
    policy: RetryPolicy,
}

impl Dispatcher<ReqwestTransport> {
    /// Build a dispatcher with the production transport.
    pub fn from_config(config: &DispatcherConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(&config.client)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, config: &DispatcherConfig) -> Self {
        let client = &config.client;
        Self {
            transport,
            locks: BucketLocks::new(),
            gate: GlobalGate::new(),
            credentials: Credentials::new(client.token.clone(), client.bot),
            user_agent: client.user_agent.clone(),
            api_base: client.api_base.trim_end_matches('/').to_string(),
            use_clock: config.rate_limit.use_clock,
            policy: RetryPolicy::new(&config.retries),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn gate(&self) -> &GlobalGate {
        &self.gate
    }

    pub fn locks(&self) -> &BucketLocks {
        &self.locks
    }

    /// Absolute URL for a route.
    pub fn url_for(&self, route: &Route) -> String {
        format!("{}{}", self.api_base, route.path())
    }

    /// Send a request and return the decoded body of the successful response.
    pub async fn request(&self, route: &Route, options: RequestOptions) -> DispatchResult<ResponseBody> {
        let span = tracing::debug_span!(
            "dispatch",
            request_id = %Uuid::new_v4(),
            method = %route.method(),
            bucket = %route.bucket(),
        );
        self.dispatch(route, options).instrument(span).await
    }

    async fn dispatch(&self, route: &Route, mut options: RequestOptions) -> DispatchResult<ResponseBody> {
        let started = StdInstant::now();
        let method = route.method().clone();
        let url = self.url_for(route);

        let payload_json = options.json.take().map(|value| value.to_string());
        let bare_json = payload_json.is_some() && options.files.is_empty();
        let request_headers = build_headers(
            &self.user_agent,
            &self.credentials,
            bare_json,
            options.reason.as_deref(),
        )
        .map_err(|e| DispatchError::Request(e.to_string()))?;

        // A global limit supersedes every bucket, so check it before queueing.
        self.gate.wait_until_open().await;
        let mut bucket = BucketGuard::new(self.locks.acquire(route.bucket()).await, route.bucket());

        // Only a 429 cooldown or a consumed attempt continues the loop;
        // `has_next` bounds the attempts.
        let mut attempt = 0;
        loop {
            self.gate.wait_until_open().await;

            let request = OutgoingRequest {
                method: method.clone(),
                url: url.clone(),
                headers: request_headers.clone(),
                body: build_body(payload_json.as_deref(), &mut options.files)?,
            };

            let response = match self.transport.send(request).await {
                Ok(response) => response,
                Err(err) if self.policy.retries_transport_error(attempt, &err) => {
                    tracing::warn!(attempt, error = %err, "Connection reset, retrying");
                    metrics::record_retry("connection_reset");
                    attempt += 1;
                    continue;
                }
                Err(err) => {
                    tracing::error!(attempt, error = %err, "Request failed");
                    return Err(err.into());
                }
            };

            let status = response.status;
            let data = response.decode_body();
            tracing::debug!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                attempt,
                "Response received"
            );

            if status != StatusCode::TOO_MANY_REQUESTS && is_exhausted(&response.headers) {
                self.defer_unlock(&mut bucket, route, &response);
            }

            match classify(status, &response.headers, &data, attempt, &self.policy) {
                Outcome::Success => {
                    metrics::record_request(method.as_str(), status.as_u16(), started);
                    return Ok(data);
                }
                Outcome::RetryAfter { delay, global } => {
                    tracing::warn!(
                        retry_after_secs = delay.as_secs_f64(),
                        global,
                        bucket = %route.bucket(),
                        "Rate limited, retrying after cooldown"
                    );
                    metrics::record_rate_limited(if global { "global" } else { "bucket" });

                    let hold = global.then(|| self.gate.hold_closed());
                    tokio::time::sleep(delay).await;
                    drop(hold);
                    tracing::debug!("Rate limit cooldown over");
                }
                Outcome::Backoff(_) if !self.policy.has_next(attempt) => {
                    tracing::error!(
                        attempts = attempt + 1,
                        status = status.as_u16(),
                        "Retries exhausted"
                    );
                    metrics::record_request(method.as_str(), status.as_u16(), started);
                    return Err(DispatchError::ServerError(HttpFailure::new(status, data)));
                }
                Outcome::Backoff(delay) => {
                    tracing::warn!(
                        attempt,
                        status = status.as_u16(),
                        backoff_secs = delay.as_secs(),
                        "Server error, backing off"
                    );
                    metrics::record_retry("server_error");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Outcome::Fatal(kind) => {
                    if kind == FatalKind::RateLimited {
                        metrics::record_rate_limited("unproxied");
                    }
                    metrics::record_request(method.as_str(), status.as_u16(), started);
                    return Err(DispatchError::from_kind(kind, HttpFailure::new(status, data)));
                }
            }
        }
    }

    fn defer_unlock(&self, bucket: &mut BucketGuard, route: &Route, response: &RawResponse) {
        let delay = reset_delay(&response.headers, self.use_clock).unwrap_or_else(|| {
            tracing::warn!(
                bucket = %route.bucket(),
                "Bucket exhausted but reset headers are unusable, releasing immediately"
            );
            Duration::ZERO
        });
        let Some(deadline) = Instant::now().checked_add(delay) else {
            tracing::warn!(
                bucket = %route.bucket(),
                retry_secs = delay.as_secs_f64(),
                "Bucket reset is out of range, releasing immediately"
            );
            return;
        };
        tracing::debug!(
            bucket = %route.bucket(),
            platform_bucket = bucket_hash(&response.headers).unwrap_or("-"),
            retry_secs = delay.as_secs_f64(),
            "Rate limit bucket exhausted"
        );
        bucket.defer_until(deadline);
    }
}

/// Body for one attempt. Files are rewound first so every attempt uploads
/// their full content.
fn build_body(payload_json: Option<&str>, files: &mut [FilePayload]) -> DispatchResult<RequestBody> {
    if files.is_empty() {
        return Ok(match payload_json {
            Some(json) => RequestBody::Json(json.to_string()),
            None => RequestBody::Empty,
        });
    }

    let mut parts = Vec::with_capacity(files.len());
    for file in files.iter_mut() {
        file.reset()?;
        parts.push(file.read_part()?);
    }
    Ok(RequestBody::Multipart {
        payload_json: payload_json.map(str::to_string),
        files: parts,
    })
}
