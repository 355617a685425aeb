//! Errors raised at the boundary with the host service manager.

use std::io;

use thiserror::Error;

/// Registering the control handler with the host failed.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Installing the control request listeners failed.
    #[error("failed to install control listeners for '{name}': {source}")]
    ControlListener {
        /// Service name being registered.
        name: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The host refused the registration.
    #[error("host refused registration of '{name}': {reason}")]
    Rejected {
        /// Service name being registered.
        name: String,
        /// Host-supplied reason.
        reason: String,
    },
}

/// Relaying a status record to the host failed.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The notification could not be delivered.
    #[error("failed to deliver status notification: {source}")]
    Delivery {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The host rejected the status record.
    #[error("host rejected status update: {reason}")]
    Rejected {
        /// Host-supplied reason.
        reason: String,
    },
}

/// Creating the stop signal failed.
#[derive(Debug, Error)]
#[error("failed to create stop signal (host error {code}): {message}")]
pub struct SignalCreationError {
    code: u32,
    message: String,
}

impl SignalCreationError {
    /// Builds an error carrying the host-reported error code.
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Host-reported error code, published as the exit code.
    #[must_use]
    pub const fn code(&self) -> u32 {
        self.code
    }
}

/// Handing control to the host dispatcher failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The process was not launched by a service manager.
    #[error("not launched as a managed service")]
    NotManaged,
    /// The host-managed service thread could not be started.
    #[error("failed to start service thread for '{name}': {source}")]
    Spawn {
        /// Service name being dispatched.
        name: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The lifecycle entry point panicked.
    #[error("service entry point for '{name}' panicked")]
    EntryPointPanicked {
        /// Service name being dispatched.
        name: String,
    },
}
