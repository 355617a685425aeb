//! The lifecycle entry point the host invokes for one daemon run.

use std::sync::Arc;
use std::time::Duration;

use snorlax_config::Config;
use tracing::{debug, info};

use crate::controller::ServiceController;
use crate::errors::LifecycleError;
use crate::health::LifecycleReporter;
use crate::host::ServiceHost;
use crate::run_loop::RunLoop;
use crate::status::{CheckpointPolicy, StatusRecord};

pub(crate) const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Parameters of a single lifecycle run, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// Name the control handler is registered under.
    pub service_name: String,
    /// Wait hint published with pending states.
    pub wait_hint: Duration,
    /// Interval between stop signal checks in the run loop.
    pub poll_interval: Duration,
    /// Checkpoints published by each transition.
    pub policy: CheckpointPolicy,
}

impl LifecycleSettings {
    /// Resolves settings from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            service_name: config.service_name().to_owned(),
            wait_hint: config.wait_hint(),
            poll_interval: config.poll_interval(),
            policy: CheckpointPolicy::from_config(config),
        }
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Outcome of a run that reached `STOPPED` cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Placeholder work units completed while running.
    pub units: u64,
}

/// Drives one run from `START_PENDING` to `STOPPED`.
///
/// The sequence is:
///
/// 1. register the control handler (a failure publishes nothing);
/// 2. publish `START_PENDING`;
/// 3. create the stop signal, publishing `STOPPED` with the host error code
///    if that fails;
/// 4. publish `RUNNING` and run the loop until a stop request sets the signal;
/// 5. publish `STOPPED`.
///
/// Any failed publish ends the run at that point. The host observes the
/// lifecycle only through the published records; the returned value exists
/// for logging and tests.
///
/// # Errors
///
/// Returns the [`LifecycleError`] that ended the run before a clean `STOPPED`.
pub fn service_main<H>(
    host: &H,
    settings: &LifecycleSettings,
    reporter: Arc<dyn LifecycleReporter>,
) -> Result<RunSummary, LifecycleError>
where
    H: ServiceHost + ?Sized,
{
    let controller = ServiceController::new(
        StatusRecord::start_pending(settings.wait_hint),
        settings.policy,
        Arc::clone(&reporter),
    );

    let handle = match host.register(&settings.service_name, controller.control_handler()) {
        Ok(handle) => handle,
        Err(source) => {
            reporter.registration_failed(&settings.service_name, &source);
            return Err(LifecycleError::Registration { source });
        }
    };
    controller.attach_handle(handle);
    debug!(
        target: LIFECYCLE_TARGET,
        service = %settings.service_name,
        "control handler registered"
    );

    controller.publish_current()?;

    let stop = match host.create_stop_signal() {
        Ok(stop) => stop,
        Err(source) => {
            reporter.signal_creation_failed(&source);
            let checkpoint = settings.policy.signal_failure;
            controller.advance(|record| record.fail_start(source.code(), checkpoint))?;
            return Err(LifecycleError::SignalCreation { source });
        }
    };
    controller.attach_stop_signal(stop.clone());

    let run_loop = RunLoop::new(settings.poll_interval);
    controller.advance(StatusRecord::enter_running)?;
    info!(
        target: LIFECYCLE_TARGET,
        service = %settings.service_name,
        poll_interval = ?run_loop.poll_interval(),
        "service running"
    );

    let units = run_loop.run(&stop);
    reporter.run_loop_exited(units);

    let stopped = settings.policy.stopped;
    controller.advance(|record| record.enter_stopped(stopped))?;
    info!(
        target: LIFECYCLE_TARGET,
        service = %settings.service_name,
        units,
        "service stopped"
    );
    Ok(RunSummary { units })
}
