//! Dispatcher double that runs the entry point against a [`RecordingHost`].

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::host::{DispatchError, Dispatcher, ServiceControl, ServiceEntry};
use crate::status::ServiceState;

use super::RecordingHost;

const RUNNING_POLL: Duration = Duration::from_millis(20);

/// Runs the entry on a named thread and stops it once it reports `RUNNING`.
pub struct StoppingDispatcher {
    host: Arc<RecordingHost>,
    managed: bool,
}

impl StoppingDispatcher {
    pub fn managed(host: Arc<RecordingHost>) -> Self {
        Self {
            host,
            managed: true,
        }
    }

    pub fn unmanaged(host: Arc<RecordingHost>) -> Self {
        Self {
            host,
            managed: false,
        }
    }
}

impl Dispatcher for StoppingDispatcher {
    type Host = RecordingHost;

    fn dispatch(&self, entry: ServiceEntry<RecordingHost>) -> Result<(), DispatchError> {
        if !self.managed {
            return Err(DispatchError::NotManaged);
        }
        let (name, main) = entry.into_parts();
        let host = Arc::clone(&self.host);
        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn(move || main(&*host))
            .map_err(|source| DispatchError::Spawn {
                name: name.clone(),
                source,
            })?;

        while !worker.is_finished() {
            if self.host.wait_for_state(ServiceState::Running, RUNNING_POLL) {
                self.host.send_control(ServiceControl::Stop);
                break;
            }
        }
        worker
            .join()
            .map_err(|_| DispatchError::EntryPointPanicked { name })
    }
}
