//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dispatcher.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatcherConfig {
    /// API endpoint, credentials and transport settings.
    pub client: ClientConfig,

    /// Rate-limit header interpretation.
    pub rate_limit: RateLimitConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// API client configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL that route paths are appended to.
    pub api_base: String,

    /// Account token. Usually supplied through `BUCKETGATE_TOKEN` instead.
    pub token: Option<String>,

    /// Bot account (`Authorization: Bot <token>`) or user account (raw token).
    pub bot: bool,

    /// User-Agent sent with every request.
    pub user_agent: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Optional outbound proxy.
    pub proxy: Option<ProxyConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "https://discord.com/api/v7".to_string(),
            token: None,
            bot: true,
            user_agent: format!(
                "DiscordBot (https://github.com/bucketgate/bucketgate, {})",
                env!("CARGO_PKG_VERSION")
            ),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            proxy: None,
        }
    }
}

// Keep the token out of logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("bot", &self.bot)
            .field("user_agent", &self.user_agent)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("proxy", &self.proxy)
            .finish()
    }
}

/// Outbound proxy settings.
#[derive(Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Proxy URL (e.g., "http://127.0.0.1:3128").
    pub url: String,

    /// Basic auth username.
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password.
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Rate-limit header interpretation.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Compute reset delays from `X-Ratelimit-Reset` and the local clock
    /// instead of trusting `X-Ratelimit-Reset-After`.
    pub use_clock: bool,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts consumed by 500/502 responses and connection resets.
    /// Rate-limited (429) re-sends do not count.
    pub max_attempts: u32,

    /// Backoff before the first server-error retry, in seconds.
    pub server_error_base_secs: u64,

    /// Backoff added per consumed attempt, in seconds.
    pub server_error_step_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            server_error_base_secs: 1,
            server_error_step_secs: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
