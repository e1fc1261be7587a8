//! Global rate-limit gate.
//!
//! # State Transitions
//! ```text
//! Open → Closed: a 429 announces an account-wide (global) limit
//! Closed → Open: every announced cooldown has elapsed
//! ```
//!
//! While closed, every caller of `wait_until_open` is suspended regardless
//! of bucket. Overlapping cooldowns each hold the gate; it reopens when the
//! last one ends.

use std::sync::Arc;

use tokio::sync::watch;

/// Gate shared by every bucket. The watched value is the number of active
/// cooldowns.
#[derive(Debug, Clone)]
pub struct GlobalGate {
    holds: Arc<watch::Sender<usize>>,
}

impl GlobalGate {
    /// Create an open gate.
    pub fn new() -> Self {
        let (holds, _) = watch::channel(0);
        Self {
            holds: Arc::new(holds),
        }
    }

    pub fn is_open(&self) -> bool {
        *self.holds.borrow() == 0
    }

    /// Close the gate until the returned hold is dropped.
    pub fn hold_closed(&self) -> GateHold<'_> {
        self.holds.send_modify(|n| *n += 1);
        tracing::debug!(holds = *self.holds.borrow(), "Global gate closed");
        GateHold { gate: self }
    }

    /// Return once the gate is open. Immediate if it already is.
    pub async fn wait_until_open(&self) {
        let mut rx = self.holds.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|holds| *holds == 0).await;
    }

    fn release(&self) {
        self.holds.send_modify(|n| *n = n.saturating_sub(1));
        if self.is_open() {
            tracing::debug!("Global gate reopened");
        }
    }
}

/// Keeps a [`GlobalGate`] closed; releases its hold on drop.
#[derive(Debug)]
pub struct GateHold<'a> {
    gate: &'a GlobalGate,
}

impl Drop for GateHold<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

impl Default for GlobalGate {
    fn default() -> Self {
        Self::new()
    }
}
