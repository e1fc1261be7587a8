//! Transport abstraction and the reqwest-backed implementation.

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Proxy};
use thiserror::Error;

use crate::config::ClientConfig;
use crate::http::request::{OutgoingRequest, RequestBody};
use crate::http::response::RawResponse;

/// Errors raised while talking to the network.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The peer reset the connection. Retried by the dispatcher.
    #[error("Connection reset: {0}")]
    ConnectionReset(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Other(String),

    /// The transport itself could not be built.
    #[error("Invalid transport configuration: {0}")]
    Config(String),
}

impl TransportError {
    pub fn is_connection_reset(&self) -> bool {
        matches!(self, TransportError::ConnectionReset(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if is_connection_reset(&err) {
            TransportError::ConnectionReset(err.to_string())
        } else if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Walk the source chain looking for an `io::ErrorKind::ConnectionReset`.
fn is_connection_reset(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::ConnectionReset {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// Issues a single HTTP request and yields the raw response.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: OutgoingRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: OutgoingRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send {
        (**self).send(request)
    }
}

/// Production transport on a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client honoring timeouts and proxy settings.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs));

        if let Some(proxy_config) = &config.proxy {
            let mut proxy = Proxy::all(&proxy_config.url)
                .map_err(|e| TransportError::Config(format!("invalid proxy '{}': {}", proxy_config.url, e)))?;
            if let Some(username) = &proxy_config.username {
                proxy = proxy.basic_auth(username, proxy_config.password.as_deref().unwrap_or(""));
            }
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(json) => builder.body(json),
            RequestBody::Multipart { payload_json, files } => {
                let mut form = Form::new();
                if let Some(json) = payload_json {
                    form = form.text("payload_json", json);
                }
                let single = files.len() == 1;
                for (i, file) in files.into_iter().enumerate() {
                    let name = if single { "file".to_string() } else { format!("file{}", i) };
                    form = form.part(name, Part::bytes(file.data).file_name(file.filename));
                }
                builder.multipart(form)
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
