//! The status record published to the host and the transitions it permits.
//!
//! A record only moves forward through `START_PENDING → RUNNING →
//! STOP_PENDING → STOPPED`. The single shortcut is `START_PENDING → STOPPED`,
//! taken when the daemon cannot finish starting and reports the failure with
//! a non-zero exit code.

use std::fmt;
use std::time::Duration;

use snorlax_config::Config;
use thiserror::Error;

/// How the daemon is hosted by the service manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceKind {
    /// A standalone daemon running in its own process.
    #[default]
    OwnProcess,
}

/// Lifecycle state reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceState {
    /// Registration and start-up work is in progress.
    StartPending,
    /// The daemon is running and accepts stop requests.
    Running,
    /// A stop request was accepted and shutdown is in progress.
    StopPending,
    /// The daemon has finished.
    Stopped,
}

impl ServiceState {
    /// Stable lowercase label used in logs and host notifications.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartPending => "start_pending",
            Self::Running => "running",
            Self::StopPending => "stop_pending",
            Self::Stopped => "stopped",
        }
    }

    /// Whether the host should treat this state as an in-flight transition.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::StartPending | Self::StopPending)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bit set of control requests the daemon currently honours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ControlsAccepted(u32);

impl ControlsAccepted {
    /// No controls are accepted.
    pub const NONE: Self = Self(0);
    /// Stop requests are accepted.
    pub const STOP: Self = Self(0x1);

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bits are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Checkpoint values published for each transition that carries one.
///
/// `START_PENDING` and `RUNNING` always publish checkpoint zero. The remaining
/// values are deployment policy; the defaults reproduce the reference daemon,
/// which publishes a lower checkpoint for `STOPPED` than for `STOP_PENDING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointPolicy {
    /// Checkpoint published by the control handler with `STOP_PENDING`.
    pub stop_pending: u32,
    /// Checkpoint published with the final `STOPPED` status of a clean run.
    pub stopped: u32,
    /// Checkpoint published with `STOPPED` when the stop signal is unavailable.
    pub signal_failure: u32,
}

impl CheckpointPolicy {
    /// Reads the policy from configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            stop_pending: config.stop_pending_checkpoint(),
            stopped: config.stopped_checkpoint(),
            signal_failure: config.signal_failure_checkpoint(),
        }
    }
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A transition the record refused to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move service status from {from} to {to}")]
pub struct TransitionRefused {
    /// State the record was in.
    pub from: ServiceState,
    /// State that was requested.
    pub to: ServiceState,
}

/// Snapshot of the daemon lifecycle as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    kind: ServiceKind,
    state: ServiceState,
    controls_accepted: ControlsAccepted,
    exit_code: u32,
    checkpoint: u32,
    wait_hint: Duration,
}

impl StatusRecord {
    /// Initial record for a run that has just been invoked by the host.
    #[must_use]
    pub const fn start_pending(wait_hint: Duration) -> Self {
        Self {
            kind: ServiceKind::OwnProcess,
            state: ServiceState::StartPending,
            controls_accepted: ControlsAccepted::NONE,
            exit_code: 0,
            checkpoint: 0,
            wait_hint,
        }
    }

    /// Hosting model for the daemon.
    #[must_use]
    pub const fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ServiceState {
        self.state
    }

    /// Controls the daemon currently honours.
    #[must_use]
    pub const fn controls_accepted(&self) -> ControlsAccepted {
        self.controls_accepted
    }

    /// Exit code; zero reports success.
    #[must_use]
    pub const fn exit_code(&self) -> u32 {
        self.exit_code
    }

    /// Progress checkpoint for pending states.
    #[must_use]
    pub const fn checkpoint(&self) -> u32 {
        self.checkpoint
    }

    /// Time the host should allow before considering a transition hung.
    #[must_use]
    pub const fn wait_hint(&self) -> Duration {
        self.wait_hint
    }

    /// Moves to `RUNNING` and starts accepting stop requests.
    pub fn enter_running(&mut self) -> Result<(), TransitionRefused> {
        self.guard(ServiceState::Running, &[ServiceState::StartPending])?;
        self.controls_accepted = ControlsAccepted::STOP;
        self.state = ServiceState::Running;
        self.exit_code = 0;
        self.checkpoint = 0;
        Ok(())
    }

    /// Moves to `STOP_PENDING` after a stop request was accepted.
    pub fn enter_stop_pending(&mut self, checkpoint: u32) -> Result<(), TransitionRefused> {
        self.guard(ServiceState::StopPending, &[ServiceState::Running])?;
        self.controls_accepted = ControlsAccepted::NONE;
        self.exit_code = 0;
        self.state = ServiceState::StopPending;
        self.checkpoint = checkpoint;
        Ok(())
    }

    /// Moves to `STOPPED` at the end of a clean run.
    pub fn enter_stopped(&mut self, checkpoint: u32) -> Result<(), TransitionRefused> {
        self.guard(ServiceState::Stopped, &[ServiceState::StopPending])?;
        self.finish(0, checkpoint);
        Ok(())
    }

    /// Moves straight from `START_PENDING` to `STOPPED` when start-up fails.
    pub fn fail_start(&mut self, exit_code: u32, checkpoint: u32) -> Result<(), TransitionRefused> {
        self.guard(ServiceState::Stopped, &[ServiceState::StartPending])?;
        self.finish(exit_code, checkpoint);
        Ok(())
    }

    fn finish(&mut self, exit_code: u32, checkpoint: u32) {
        self.controls_accepted = ControlsAccepted::NONE;
        self.state = ServiceState::Stopped;
        self.exit_code = exit_code;
        self.checkpoint = checkpoint;
    }

    fn guard(&self, to: ServiceState, allowed_from: &[ServiceState]) -> Result<(), TransitionRefused> {
        if allowed_from.contains(&self.state) {
            Ok(())
        } else {
            Err(TransitionRefused {
                from: self.state,
                to,
            })
        }
    }
}
