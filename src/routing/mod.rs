//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! (method, template, params)
//!     → route.rs (placeholder resolution, bucket key)
//!     → Route (immutable)
//!     → dispatcher (URL = api_base + path, lock = bucket key)
//! ```

pub mod route;

pub use route::Route;

use thiserror::Error;

/// Errors raised while resolving a route template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Missing route parameter '{0}'")]
    MissingParameter(String),

    #[error("Unclosed placeholder in route template '{0}'")]
    UnclosedPlaceholder(String),
}
