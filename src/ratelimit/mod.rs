//! Rate-limit coordination.
//!
//! # Data Flow
//! ```text
//! Before each call:
//!     → gate.rs (wait while a global limit is in force)
//!     → locks.rs (exclusive lock for the route's bucket)
//!
//! After each response:
//!     → headers.rs (remaining quota, reset delay)
//!     → unlock.rs (release now, or hold until the bucket resets)
//! ```
//!
//! # Design Decisions
//! - At most one in-flight request per bucket
//! - A closed global gate blocks every bucket
//! - The lock guard is owned, so releasing it twice is impossible

pub mod gate;
pub mod headers;
pub mod locks;
pub mod unlock;

pub use gate::{GateHold, GlobalGate};
pub use locks::BucketLocks;
pub use unlock::BucketGuard;
