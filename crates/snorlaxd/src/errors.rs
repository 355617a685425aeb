//! Error surface for a single lifecycle run and for launching the daemon.

use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use crate::host::{DispatchError, PublishError, RegistrationError, SignalCreationError};
use crate::status::{ServiceState, TransitionRefused};
use crate::telemetry::TelemetryError;

/// Exit code reported when the process was not started by a service manager.
pub const NOT_MANAGED_EXIT_CODE: u8 = 2;

/// Reasons a lifecycle run ended before reaching a clean `STOPPED`.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The host refused the control handler; nothing was published.
    #[error("failed to register control handler: {source}")]
    Registration {
        /// Underlying host error.
        #[source]
        source: RegistrationError,
    },
    /// The host did not accept a status record; the run was abandoned.
    #[error("failed to publish {state} status: {source}")]
    Publish {
        /// State that failed to publish.
        state: ServiceState,
        /// Underlying host error.
        #[source]
        source: PublishError,
    },
    /// The stop signal could not be created; `STOPPED` was published.
    #[error("failed to create stop signal: {source}")]
    SignalCreation {
        /// Underlying host error.
        #[source]
        source: SignalCreationError,
    },
    /// The status record refused a transition.
    #[error("invalid lifecycle transition: {source}")]
    Transition {
        /// Refused transition.
        #[source]
        source: TransitionRefused,
    },
}

/// Errors surfaced while launching the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The host dispatcher could not run the service.
    #[error("service dispatch failed: {source}")]
    Dispatch {
        /// Underlying dispatch error.
        #[source]
        source: DispatchError,
    },
}

impl LaunchError {
    /// Process exit code communicating this failure.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Dispatch {
                source: DispatchError::NotManaged,
            } => ExitCode::from(NOT_MANAGED_EXIT_CODE),
            _ => ExitCode::FAILURE,
        }
    }
}

impl From<Arc<OrthoError>> for LaunchError {
    fn from(source: Arc<OrthoError>) -> Self {
        Self::Config { source }
    }
}

impl From<TelemetryError> for LaunchError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

impl From<DispatchError> for LaunchError {
    fn from(source: DispatchError) -> Self {
        Self::Dispatch { source }
    }
}
