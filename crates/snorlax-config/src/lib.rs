//! Shared configuration for the Snorlax service daemon.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! configuration file, then `SNORLAX_*` environment variables, then command
//! line flags. Every field has a default so the daemon starts with no
//! configuration at all, which is the normal case when a service manager
//! launches it.
//!
//! The lifecycle tunables live here rather than in the daemon crate so the
//! checkpoint values and timing budget can be adjusted per deployment without
//! rebuilding.

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SERVICE_NAME,
    DEFAULT_SIGNAL_FAILURE_CHECKPOINT, DEFAULT_STOP_PENDING_CHECKPOINT,
    DEFAULT_STOPPED_CHECKPOINT, DEFAULT_WAIT_HINT_MS,
    default_log_filter_string, default_log_format, default_service_name,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SNORLAX")]
pub struct Config {
    /// Name registered with the host service manager.
    #[ortho_config(default = defaults::default_service_name())]
    #[serde(default = "defaults::default_service_name")]
    pub service_name: String,
    /// Milliseconds between stop-signal checks while running.
    #[ortho_config(default = defaults::DEFAULT_POLL_INTERVAL_MS)]
    #[serde(default = "defaults::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Milliseconds the host should wait on a pending transition.
    #[ortho_config(default = defaults::DEFAULT_WAIT_HINT_MS)]
    #[serde(default = "defaults::default_wait_hint_ms")]
    pub wait_hint_ms: u32,
    /// Checkpoint published on entry to `STOP_PENDING`.
    #[ortho_config(default = defaults::DEFAULT_STOP_PENDING_CHECKPOINT)]
    #[serde(default = "defaults::default_stop_pending_checkpoint")]
    pub stop_pending_checkpoint: u32,
    /// Checkpoint published with the final `STOPPED` status.
    #[ortho_config(default = defaults::DEFAULT_STOPPED_CHECKPOINT)]
    #[serde(default = "defaults::default_stopped_checkpoint")]
    pub stopped_checkpoint: u32,
    /// Checkpoint published with `STOPPED` when stop-signal creation fails.
    #[ortho_config(default = defaults::DEFAULT_SIGNAL_FAILURE_CHECKPOINT)]
    #[serde(default = "defaults::default_signal_failure_checkpoint")]
    pub signal_failure_checkpoint: u32,
    /// `tracing-subscriber` filter expression.
    #[ortho_config(default = defaults::default_log_filter_string())]
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for structured logs.
    #[ortho_config(default = defaults::default_log_format())]
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            wait_hint_ms: DEFAULT_WAIT_HINT_MS,
            stop_pending_checkpoint: DEFAULT_STOP_PENDING_CHECKPOINT,
            stopped_checkpoint: DEFAULT_STOPPED_CHECKPOINT,
            signal_failure_checkpoint: DEFAULT_SIGNAL_FAILURE_CHECKPOINT,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Name registered with the host service manager.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Interval between stop-signal checks.
    ///
    /// A configured value of zero is raised to one millisecond so the run
    /// loop never degenerates into a spin.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Wait hint published alongside pending states.
    #[must_use]
    pub fn wait_hint(&self) -> Duration {
        Duration::from_millis(u64::from(self.wait_hint_ms))
    }

    /// Checkpoint published on entry to `STOP_PENDING`.
    #[must_use]
    pub const fn stop_pending_checkpoint(&self) -> u32 {
        self.stop_pending_checkpoint
    }

    /// Checkpoint published with the final `STOPPED` status.
    #[must_use]
    pub const fn stopped_checkpoint(&self) -> u32 {
        self.stopped_checkpoint
    }

    /// Checkpoint published when the stop signal cannot be created.
    #[must_use]
    pub const fn signal_failure_checkpoint(&self) -> u32 {
        self.signal_failure_checkpoint
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
