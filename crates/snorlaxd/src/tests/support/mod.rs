//! Test harness utilities for the lifecycle suites.

mod config_loader;
mod dispatcher;
mod host;
mod reporter;

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub use config_loader::FailingConfigLoader;
pub use dispatcher::StoppingDispatcher;
pub use host::{HostFailures, Published, RecordingHost};
pub use reporter::{LifecycleEvent, RecordingLifecycleReporter};

use crate::errors::LifecycleError;
use crate::host::ServiceControl;
use crate::lifecycle::{LifecycleSettings, RunSummary, service_main};
use crate::status::ServiceState;

/// Generous upper bound for waits that normally complete in milliseconds.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Starts `service_main` against `host` on its own thread.
pub fn spawn_service(
    host: &Arc<RecordingHost>,
    settings: LifecycleSettings,
    reporter: Arc<RecordingLifecycleReporter>,
) -> JoinHandle<Result<RunSummary, LifecycleError>> {
    let host = Arc::clone(host);
    thread::Builder::new()
        .name(settings.service_name.clone())
        .spawn(move || service_main(&*host, &settings, reporter))
        .expect("failed to spawn service thread")
}

/// Runs `service_main` to completion, sending `STOP` once it reports `RUNNING`.
pub fn run_until_stopped(
    host: &Arc<RecordingHost>,
    settings: LifecycleSettings,
    reporter: Arc<RecordingLifecycleReporter>,
) -> Result<RunSummary, LifecycleError> {
    let worker = spawn_service(host, settings, reporter);
    while !worker.is_finished() {
        if host.wait_for_state(ServiceState::Running, Duration::from_millis(20)) {
            host.send_control(ServiceControl::Stop);
            break;
        }
    }
    worker.join().expect("service thread panicked")
}
