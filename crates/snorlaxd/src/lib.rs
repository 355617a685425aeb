//! Lifecycle controller for the Snorlax background daemon.
//!
//! The daemon registers with a host service manager, reports each step of its
//! `START_PENDING → RUNNING → STOP_PENDING → STOPPED` progression, and winds
//! down cooperatively when the host asks it to stop. There is no workload
//! beyond a placeholder loop: the crate exists to get the lifecycle right.
//!
//! The host is reached only through the traits in [`host`]. The shipped
//! implementation speaks the systemd notification protocol; tests drive the
//! same state machine through recording doubles.
//!
//! The moving parts are:
//!
//! - [`StatusRecord`], the value published to the host, which refuses
//!   transitions that would move backwards;
//! - [`ServiceController`], which owns the record, the registration handle,
//!   and the [`StopSignal`], and answers control requests;
//! - [`service_main`], the entry point a [`Dispatcher`](host::Dispatcher)
//!   runs on a host-managed thread;
//! - [`run_service`], which loads configuration, installs telemetry, and hands
//!   the process to the host.

mod bootstrap;
mod controller;
mod errors;
mod health;
pub mod host;
mod launch;
mod lifecycle;
mod run_loop;
mod signal;
mod status;
mod telemetry;

pub use bootstrap::{ConfigLoader, StaticConfigLoader, SystemConfigLoader};
pub use controller::ServiceController;
pub use errors::{LaunchError, LifecycleError, NOT_MANAGED_EXIT_CODE};
pub use health::{LifecycleReporter, StructuredLifecycleReporter};
pub use launch::{LaunchPlan, run_service, run_service_with};
pub use lifecycle::{LifecycleSettings, RunSummary, service_main};
pub use run_loop::RunLoop;
pub use signal::StopSignal;
pub use status::{
    CheckpointPolicy, ControlsAccepted, ServiceKind, ServiceState, StatusRecord, TransitionRefused,
};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
