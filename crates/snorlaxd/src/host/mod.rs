//! Contract with the host service manager.
//!
//! The lifecycle state machine only talks to the host through these traits:
//! it registers a control handler, publishes status records through the
//! returned handle, and asks the host for a stop signal. A [`Dispatcher`]
//! owns the process entry and runs the lifecycle on a host-managed thread.

use std::fmt;
use std::sync::Arc;

use crate::signal::StopSignal;
use crate::status::StatusRecord;

mod errors;
#[cfg(unix)]
pub mod systemd;

pub use errors::{DispatchError, PublishError, RegistrationError, SignalCreationError};

pub(crate) const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

/// Control request delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceControl {
    /// Stop the daemon.
    Stop,
    /// The host itself is shutting down.
    Shutdown,
    /// Pause work.
    Pause,
    /// Resume paused work.
    Continue,
    /// Report current status.
    Interrogate,
    /// Re-read configuration parameters.
    ParamChange,
    /// A host-specific code with no dedicated variant.
    Other(u32),
}

impl fmt::Display for ServiceControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => f.write_str("stop"),
            Self::Shutdown => f.write_str("shutdown"),
            Self::Pause => f.write_str("pause"),
            Self::Continue => f.write_str("continue"),
            Self::Interrogate => f.write_str("interrogate"),
            Self::ParamChange => f.write_str("param_change"),
            Self::Other(code) => write!(f, "other({code})"),
        }
    }
}

/// Callback the host invokes, on a thread it owns, for each control request.
pub type ControlHandler = Arc<dyn Fn(ServiceControl) + Send + Sync>;

/// Relays status records to the host.
pub trait StatusHandle: Send + Sync {
    /// Publishes `record` as the daemon's current status.
    fn publish(&self, record: &StatusRecord) -> Result<(), PublishError>;
}

/// Host operations available to the lifecycle entry point.
pub trait ServiceHost: Send + Sync {
    /// Ties `name` to `handler` and returns the handle used to publish status.
    fn register(
        &self,
        name: &str,
        handler: ControlHandler,
    ) -> Result<Arc<dyn StatusHandle>, RegistrationError>;

    /// Creates the stop signal for this run.
    fn create_stop_signal(&self) -> Result<StopSignal, SignalCreationError> {
        Ok(StopSignal::new())
    }
}

/// A named lifecycle entry point handed to a [`Dispatcher`].
pub struct ServiceEntry<H> {
    name: String,
    main: Box<dyn FnOnce(&H) + Send>,
}

impl<H> ServiceEntry<H> {
    /// Pairs a service name with its entry point.
    pub fn new(name: impl Into<String>, main: impl FnOnce(&H) + Send + 'static) -> Self {
        Self {
            name: name.into(),
            main: Box::new(main),
        }
    }

    /// Service name the entry point runs under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Splits the entry into its name and callable.
    #[must_use]
    pub fn into_parts(self) -> (String, Box<dyn FnOnce(&H) + Send>) {
        (self.name, self.main)
    }
}

impl<H> fmt::Debug for ServiceEntry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Hands the process over to the host's control dispatch mechanism.
pub trait Dispatcher {
    /// Host implementation the entry point receives.
    type Host: ServiceHost;

    /// Runs `entry` on a host-managed thread and blocks until it returns.
    fn dispatch(&self, entry: ServiceEntry<Self::Host>) -> Result<(), DispatchError>;
}
