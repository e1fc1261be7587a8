//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bucketgate::config::DispatcherConfig;
use bucketgate::http::{OutgoingRequest, RawResponse, RequestBody, Transport, TransportError};
use bucketgate::Dispatcher;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

pub const API_BASE: &str = "http://api.test/v7";

/// One scripted reply.
pub enum Step {
    Respond(RawResponse),
    Fail(TransportError),
}

/// A request as the transport saw it.
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub at: Instant,
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// In-memory transport replaying per-path scripts.
///
/// Paths without a remaining script get `200 {}`.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    sent: Mutex<Vec<SentRequest>>,
    in_flight: Mutex<HashMap<String, usize>>,
    max_in_flight: Mutex<HashMap<String, usize>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send takes `latency` before answering.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn script(&self, path: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url(path))
            .or_default()
            .extend(steps);
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, path: &str) -> Vec<SentRequest> {
        let target = url(path);
        self.sent().into_iter().filter(|r| r.url == target).collect()
    }

    pub fn max_in_flight(&self, path: &str) -> usize {
        self.max_in_flight
            .lock()
            .unwrap()
            .get(&url(path))
            .copied()
            .unwrap_or(0)
    }

    fn enter(&self, url: &str) {
        let mut in_flight = self.in_flight.lock().unwrap();
        let count = in_flight.entry(url.to_string()).or_default();
        *count += 1;
        let mut max = self.max_in_flight.lock().unwrap();
        let peak = max.entry(url.to_string()).or_default();
        *peak = (*peak).max(*count);
    }

    fn leave(&self, url: &str) {
        if let Some(count) = self.in_flight.lock().unwrap().get_mut(url) {
            *count -= 1;
        }
    }

    fn next_step(&self, url: &str) -> Step {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Step::Respond(ok_json(serde_json::json!({}))))
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError> {
        self.sent.lock().unwrap().push(SentRequest {
            at: Instant::now(),
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });

        self.enter(&request.url);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let step = self.next_step(&request.url);
        self.leave(&request.url);

        match step {
            Step::Respond(response) => Ok(response),
            Step::Fail(err) => Err(err),
        }
    }
}

pub fn url(path: &str) -> String {
    format!("{}{}", API_BASE, path)
}

pub fn test_config() -> DispatcherConfig {
    let mut config = DispatcherConfig::default();
    config.client.api_base = API_BASE.to_string();
    config.client.token = Some("test-token".to_string());
    config
}

/// Dispatcher over a shared scripted transport.
pub fn scripted_dispatcher(
    transport: ScriptedTransport,
) -> (Arc<Dispatcher<Arc<ScriptedTransport>>>, Arc<ScriptedTransport>) {
    scripted_dispatcher_with(transport, &test_config())
}

pub fn scripted_dispatcher_with(
    transport: ScriptedTransport,
    config: &DispatcherConfig,
) -> (Arc<Dispatcher<Arc<ScriptedTransport>>>, Arc<ScriptedTransport>) {
    let transport = Arc::new(transport);
    let dispatcher = Dispatcher::new(transport.clone(), config);
    (Arc::new(dispatcher), transport)
}

/// Mark a response as the last one its bucket allows until the reset.
pub fn exhausted(response: RawResponse, reset_after: &'static str) -> RawResponse {
    response
        .with_header("x-ratelimit-remaining", "0")
        .with_header("x-ratelimit-reset-after", reset_after)
}

pub fn ok_json(value: serde_json::Value) -> RawResponse {
    RawResponse::new(StatusCode::OK).with_json(&value)
}

pub fn status(code: u16) -> RawResponse {
    let status = StatusCode::from_u16(code).unwrap();
    RawResponse::new(status).with_json(&serde_json::json!({ "message": status.canonical_reason().unwrap_or("") }))
}

/// Legitimate (proxied) 429.
pub fn rate_limited(retry_after_ms: u64, global: bool) -> RawResponse {
    RawResponse::new(StatusCode::TOO_MANY_REQUESTS)
        .with_header("via", "1.1 google")
        .with_json(&serde_json::json!({
            "message": "You are being rate limited.",
            "retry_after": retry_after_ms,
            "global": global,
        }))
}

pub fn connection_reset() -> TransportError {
    TransportError::ConnectionReset("connection reset by peer".into())
}

/// Request received by the backend on one connection.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub head: String,
    pub body: Vec<u8>,
}

impl BackendRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }
}

/// Start a programmable backend on an ephemeral port.
///
/// `f` receives each request and returns status, extra headers and body.
/// Every request is also pushed to the returned log.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Arc<Mutex<Vec<BackendRequest>>>)
where
    F: Fn(BackendRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Vec<(String, String)>, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let requests = log.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        requests.lock().unwrap().push(request.clone());

                        let (status, headers, body) = f(request).await;
                        let reason = StatusCode::from_u16(status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .unwrap_or("Unknown");
                        let mut response = format!("HTTP/1.1 {} {}\r\n", status, reason);
                        for (name, value) in headers {
                            response.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        response.push_str(&format!(
                            "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        ));
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, log)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<BackendRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut request = BackendRequest {
        head,
        body: buf[head_end + 4..].to_vec(),
    };

    let chunked = request
        .header("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"));
    if chunked {
        while !request.body.ends_with(b"0\r\n\r\n") {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            request.body.extend_from_slice(&chunk[..n]);
        }
        return Some(request);
    }

    let length = request
        .header("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    while request.body.len() < length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        request.body.extend_from_slice(&chunk[..n]);
    }

    Some(request)
}

/// JSON response with the given status and no extra headers.
pub fn json_reply(status: u16, body: serde_json::Value) -> (u16, Vec<(String, String)>, String) {
    (
        status,
        vec![("Content-Type".to_string(), "application/json".to_string())],
        body.to_string(),
    )
}
