//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → DispatcherConfig (validated, immutable)
//!     → read once when the dispatcher is built
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The token is redacted from Debug output

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ClientConfig;
pub use schema::DispatcherConfig;
pub use schema::ObservabilityConfig;
pub use schema::ProxyConfig;
pub use schema::RateLimitConfig;
pub use schema::RetryConfig;
