//! Accumulating simulation timer.

use serde::{Deserialize, Serialize};

/// Timer that accumulates simulated seconds while a condition holds.
///
/// The caller decides each step whether to [`accumulate`](Self::accumulate)
/// or [`reset`](Self::reset); expiry is checked against a limit supplied at
/// the call site so the limit can live in configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTimer {
    elapsed: f32,
}

impl SimTimer {
    /// A timer with nothing accumulated.
    pub const fn new() -> Self {
        Self { elapsed: 0.0 }
    }

    /// Add `dt` seconds.
    #[inline]
    pub fn accumulate(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// Clear the accumulated time.
    #[inline]
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Seconds accumulated since the last reset.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Whether at least `limit` seconds have accumulated.
    #[inline]
    pub fn expired(&self, limit: f32) -> bool {
        self.elapsed >= limit
    }
}
