//! Test double for [`LifecycleReporter`] that records events for assertions.

use std::sync::Mutex;

use crate::health::LifecycleReporter;
use crate::host::{PublishError, RegistrationError, ServiceControl, SignalCreationError};
use crate::status::{ServiceState, StatusRecord};

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    RegistrationFailed(String),
    StatusPublished(ServiceState),
    PublishFailed(ServiceState),
    SignalCreationFailed(u32),
    StopRequested,
    ControlIgnored(ServiceControl, ServiceState),
    RunLoopExited,
}

/// Records lifecycle events for assertions.
#[derive(Debug, Default)]
pub struct RecordingLifecycleReporter {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingLifecycleReporter {
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .expect("lifecycle reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: LifecycleEvent) {
        self.events
            .lock()
            .expect("lifecycle reporter mutex poisoned")
            .push(event);
    }
}

impl LifecycleReporter for RecordingLifecycleReporter {
    fn registration_failed(&self, service: &str, _error: &RegistrationError) {
        self.record(LifecycleEvent::RegistrationFailed(service.to_owned()));
    }

    fn status_published(&self, record: &StatusRecord) {
        self.record(LifecycleEvent::StatusPublished(record.state()));
    }

    fn publish_failed(&self, state: ServiceState, _error: &PublishError) {
        self.record(LifecycleEvent::PublishFailed(state));
    }

    fn signal_creation_failed(&self, error: &SignalCreationError) {
        self.record(LifecycleEvent::SignalCreationFailed(error.code()));
    }

    fn stop_requested(&self) {
        self.record(LifecycleEvent::StopRequested);
    }

    fn control_ignored(&self, control: ServiceControl, state: ServiceState) {
        self.record(LifecycleEvent::ControlIgnored(control, state));
    }

    fn run_loop_exited(&self, _units: u64) {
        self.record(LifecycleEvent::RunLoopExited);
    }
}
