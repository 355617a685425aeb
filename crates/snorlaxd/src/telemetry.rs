//! Log output for snorlaxd.
//!
//! Under systemd the daemon's stderr is the journal, so every event goes to
//! stderr. The `snorlaxd::lifecycle`, `snorlaxd::control`, `snorlaxd::host`
//! and `snorlaxd::launch` targets are selected by the configured filter.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use snorlax_config::{Config, LogFormat};

static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

/// Proof that the journal subscriber is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by the launch that installed the subscriber.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid `EnvFilter` directive list.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another subscriber already owns the process.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the journal subscriber on the first launch of the process.
///
/// A later launch keeps the first subscriber; its handle reports the format
/// that is actually in effect.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED_FORMAT
        .get_or_try_init(|| {
            let subscriber = journal_subscriber(config)?;
            tracing::subscriber::set_global_default(subscriber)
                .map_err(TelemetryError::Subscriber)?;
            Ok(config.log_format())
        })
        .map(|format| TelemetryHandle { format: *format })
}

fn journal_subscriber(
    config: &Config,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        // Lines from the systemd service thread and the signal listener are
        // told apart by thread name.
        .with_thread_names(true)
        .with_writer(io::stderr)
        // journald stores raw bytes; colour only when run from a terminal.
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    })
}
