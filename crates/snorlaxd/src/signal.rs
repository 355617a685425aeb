//! Manual-reset stop signal shared by the control handler and the run loop.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Single-fire event that tells the run loop to wind down.
///
/// Once set the signal stays set; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    /// Creates an unset signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the signal and wakes every waiter.
    pub fn set(&self) {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *triggered = true;
        cvar.notify_all();
    }

    /// Whether the signal has been set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the signal is set or `timeout` elapses.
    ///
    /// Returns `true` when the signal is set.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (triggered, _) = cvar
            .wait_timeout_while(guard, timeout, |triggered| !*triggered)
            .unwrap_or_else(PoisonError::into_inner);
        *triggered
    }
}
