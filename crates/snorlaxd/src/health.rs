//! Structured reporting for service lifecycle events.

use std::sync::Arc;

use crate::host::{PublishError, RegistrationError, ServiceControl, SignalCreationError};
use crate::status::{ServiceState, StatusRecord};

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait LifecycleReporter: Send + Sync {
    /// Invoked when the host refuses the control handler.
    fn registration_failed(&self, service: &str, error: &RegistrationError);

    /// Invoked after the host accepted a status record.
    fn status_published(&self, record: &StatusRecord);

    /// Invoked when the host did not accept a status record.
    fn publish_failed(&self, state: ServiceState, error: &PublishError);

    /// Invoked when the stop signal could not be created.
    fn signal_creation_failed(&self, error: &SignalCreationError);

    /// Invoked when a stop request was accepted.
    fn stop_requested(&self);

    /// Invoked when a control request is received but not acted upon.
    fn control_ignored(&self, control: ServiceControl, state: ServiceState);

    /// Invoked when the run loop observes the stop signal.
    fn run_loop_exited(&self, units: u64);
}

impl<T> LifecycleReporter for Arc<T>
where
    T: LifecycleReporter,
{
    fn registration_failed(&self, service: &str, error: &RegistrationError) {
        (**self).registration_failed(service, error);
    }

    fn status_published(&self, record: &StatusRecord) {
        (**self).status_published(record);
    }

    fn publish_failed(&self, state: ServiceState, error: &PublishError) {
        (**self).publish_failed(state, error);
    }

    fn signal_creation_failed(&self, error: &SignalCreationError) {
        (**self).signal_creation_failed(error);
    }

    fn stop_requested(&self) {
        (**self).stop_requested();
    }

    fn control_ignored(&self, control: ServiceControl, state: ServiceState) {
        (**self).control_ignored(control, state);
    }

    fn run_loop_exited(&self, units: u64) {
        (**self).run_loop_exited(units);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredLifecycleReporter;

impl StructuredLifecycleReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LifecycleReporter for StructuredLifecycleReporter {
    fn registration_failed(&self, service: &str, error: &RegistrationError) {
        tracing::error!(
            target: "snorlaxd::health",
            event = "registration_failed",
            service,
            error = %error,
            "control handler registration failed"
        );
    }

    fn status_published(&self, record: &StatusRecord) {
        tracing::info!(
            target: "snorlaxd::health",
            event = "status_published",
            state = %record.state(),
            controls_accepted = record.controls_accepted().bits(),
            exit_code = record.exit_code(),
            checkpoint = record.checkpoint(),
            wait_hint = ?record.wait_hint(),
            "service status published"
        );
    }

    fn publish_failed(&self, state: ServiceState, error: &PublishError) {
        tracing::error!(
            target: "snorlaxd::health",
            event = "publish_failed",
            state = %state,
            error = %error,
            "service status publish failed"
        );
    }

    fn signal_creation_failed(&self, error: &SignalCreationError) {
        tracing::error!(
            target: "snorlaxd::health",
            event = "signal_creation_failed",
            code = error.code(),
            error = %error,
            "stop signal unavailable"
        );
    }

    fn stop_requested(&self) {
        tracing::info!(
            target: "snorlaxd::health",
            event = "stop_requested",
            "stop request accepted"
        );
    }

    fn control_ignored(&self, control: ServiceControl, state: ServiceState) {
        tracing::debug!(
            target: "snorlaxd::health",
            event = "control_ignored",
            control = %control,
            state = %state,
            "control request ignored"
        );
    }

    fn run_loop_exited(&self, units: u64) {
        tracing::info!(
            target: "snorlaxd::health",
            event = "run_loop_exited",
            units,
            "run loop observed stop signal"
        );
    }
}
