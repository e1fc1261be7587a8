//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher produces:
//!     → logging.rs (structured log events, one span per call with a request id)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stderr via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Metric updates are no-ops until an exporter is installed
//! - The request id flows through every event of a call

pub mod logging;
pub mod metrics;
