//! Wall-clock measurement for workers and dispatch

use std::time::Instant;
use tracing::debug;

/// Measures the time since it was started
#[derive(Clone, Copy, Debug)]
pub struct Timer(Instant);

impl Timer {
    pub fn start() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.0.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Log the elapsed time for `what` and return it in milliseconds
    pub fn finish(self, what: &str) -> u64 {
        let ms = self.elapsed_ms();
        debug!("{what} took {ms}ms");
        ms
    }
}
