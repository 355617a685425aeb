//! Default values shared by the configuration loader and its callers.

/// Logical name the daemon registers with its host service manager.
pub const DEFAULT_SERVICE_NAME: &str = "SnorlaxSvc";

/// Interval between stop-signal checks in the placeholder run loop.
///
/// This bounds shutdown latency: a stop request is observed at most one
/// interval after it is signalled.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30;

/// Time the host should allow for a pending transition before treating it as hung.
pub const DEFAULT_WAIT_HINT_MS: u32 = 500;

/// Checkpoint published when the control handler enters `STOP_PENDING`.
pub const DEFAULT_STOP_PENDING_CHECKPOINT: u32 = 4;

/// Checkpoint published with the terminal `STOPPED` status after a clean run.
pub const DEFAULT_STOPPED_CHECKPOINT: u32 = 3;

/// Checkpoint published with `STOPPED` when the stop signal cannot be created.
pub const DEFAULT_SIGNAL_FAILURE_CHECKPOINT: u32 = 1;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Owned service name used by serde when the field is absent.
pub fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_owned()
}

pub(crate) const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

pub(crate) const fn default_wait_hint_ms() -> u32 {
    DEFAULT_WAIT_HINT_MS
}

pub(crate) const fn default_stop_pending_checkpoint() -> u32 {
    DEFAULT_STOP_PENDING_CHECKPOINT
}

pub(crate) const fn default_stopped_checkpoint() -> u32 {
    DEFAULT_STOPPED_CHECKPOINT
}

pub(crate) const fn default_signal_failure_checkpoint() -> u32 {
    DEFAULT_SIGNAL_FAILURE_CHECKPOINT
}
