//! Launch sequencing: configuration, telemetry, then hand-off to the host.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bootstrap::ConfigLoader;
use crate::errors::LaunchError;
use crate::health::LifecycleReporter;
use crate::host::{Dispatcher, ServiceEntry, ServiceHost};
use crate::lifecycle::{LIFECYCLE_TARGET, LifecycleSettings, service_main};
use crate::telemetry;

pub(crate) const LAUNCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launch");

/// Collaborators required to launch the daemon.
pub struct LaunchPlan<L, D> {
    /// Source of the daemon configuration.
    pub loader: L,
    /// Observer for lifecycle events.
    pub reporter: Arc<dyn LifecycleReporter>,
    /// Host dispatcher that runs the lifecycle entry point.
    pub dispatcher: D,
}

/// Runs the daemon under the production service manager.
///
/// # Errors
///
/// Returns [`LaunchError`] when configuration or telemetry fail, or when the
/// process was not launched by a service manager.
#[cfg(unix)]
pub fn run_service() -> Result<(), LaunchError> {
    use crate::bootstrap::SystemConfigLoader;
    use crate::health::StructuredLifecycleReporter;
    use crate::host::systemd::SystemdDispatcher;

    run_service_with(LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredLifecycleReporter::new()),
        dispatcher: SystemdDispatcher::from_env(),
    })
}

/// Runs the daemon under the production service manager.
///
/// No service manager integration is available on this platform, so the
/// process always reports that it was not launched as a managed service.
///
/// # Errors
///
/// Always returns [`LaunchError::Dispatch`] with
/// [`DispatchError::NotManaged`](crate::host::DispatchError::NotManaged).
#[cfg(not(unix))]
pub fn run_service() -> Result<(), LaunchError> {
    Err(LaunchError::from(crate::host::DispatchError::NotManaged))
}

/// Runs the daemon with injected collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when configuration or telemetry fail, or when the
/// dispatcher cannot run the lifecycle entry point.
pub fn run_service_with<L, D>(plan: LaunchPlan<L, D>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    D: Dispatcher,
    D::Host: 'static,
{
    let LaunchPlan {
        loader,
        reporter,
        dispatcher,
    } = plan;

    let config = loader.load()?;
    let telemetry = telemetry::initialise(&config)?;
    let settings = LifecycleSettings::from_config(&config);
    info!(
        target: LAUNCH_TARGET,
        service = %settings.service_name,
        log_format = %telemetry.format(),
        "handing control to the service manager"
    );

    if let Err(error) = dispatcher.dispatch(lifecycle_entry(settings, reporter)) {
        warn!(target: LAUNCH_TARGET, %error, "service dispatch failed");
        return Err(error.into());
    }
    info!(target: LAUNCH_TARGET, "service dispatcher returned");
    Ok(())
}

fn lifecycle_entry<H>(
    settings: LifecycleSettings,
    reporter: Arc<dyn LifecycleReporter>,
) -> ServiceEntry<H>
where
    H: ServiceHost + 'static,
{
    let name = settings.service_name.clone();
    ServiceEntry::new(name, move |host: &H| {
        if let Err(error) = service_main(host, &settings, reporter) {
            warn!(target: LIFECYCLE_TARGET, %error, "service run ended early");
        }
    })
}
