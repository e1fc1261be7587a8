//! Rate-limited REST dispatcher.
//!
//! Serializes calls per rate-limit bucket, honours global cooldowns, and
//! retries transient failures before handing back a decoded body.
//!
//! ```text
//!   caller ──▶ Dispatcher::request(route, options)
//!                 │
//!                 ▼
//!        ┌─────────────────┐     ┌──────────────┐
//!        │  global gate    │◀────│ global 429   │
//!        └────────┬────────┘     └──────────────┘
//!                 ▼
//!        ┌─────────────────┐     ┌──────────────┐
//!        │  bucket lock    │◀────│ deferred     │
//!        │  (per route)    │     │ unlock timer │
//!        └────────┬────────┘     └──────▲───────┘
//!                 ▼                     │ remaining = 0
//!        ┌─────────────────┐     ┌──────┴───────┐
//!        │   transport     │────▶│  classify    │──▶ body | error
//!        └─────────────────┘     └──────────────┘
//! ```

// Core subsystems
pub mod api;
pub mod dispatch;
pub mod http;
pub mod ratelimit;
pub mod routing;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;
pub mod resilience;

pub use config::DispatcherConfig;
pub use dispatch::Dispatcher;
pub use error::{DispatchError, DispatchResult};
pub use http::{FilePayload, RequestOptions, ResponseBody};
pub use routing::Route;
