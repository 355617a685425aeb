//! Placeholder worker loop that waits for the stop signal.

use std::time::Duration;

use tracing::trace;

use crate::lifecycle::LIFECYCLE_TARGET;
use crate::signal::StopSignal;

/// Cooperative worker that performs one unit of work per poll interval.
///
/// The interval bounds shutdown latency: the loop blocks on the stop signal
/// for at most one interval, so a stop request wakes it immediately and a
/// missed wake-up costs no more than `poll_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLoop {
    poll_interval: Duration,
}

impl RunLoop {
    /// Creates a loop that checks the stop signal every `poll_interval`.
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Interval between stop signal checks.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Runs until `stop` is set and returns the number of completed units.
    pub fn run(&self, stop: &StopSignal) -> u64 {
        let mut units = 0_u64;
        while !stop.wait_timeout(self.poll_interval) {
            units = units.saturating_add(1);
            trace!(target: LIFECYCLE_TARGET, units, "placeholder work unit completed");
        }
        units
    }
}
