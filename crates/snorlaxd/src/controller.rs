//! Shared lifecycle state reached by both the entry point and the control
//! handler.
//!
//! The controller owns the status record, the registration handle, and the
//! stop signal for a single run. Every publish happens while the status lock
//! is held, so a stop request racing the final `STOPPED` publish cannot
//! interleave its `STOP_PENDING` update with it.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use tracing::{debug, warn};

use crate::errors::LifecycleError;
use crate::health::LifecycleReporter;
use crate::host::{ControlHandler, PublishError, ServiceControl, StatusHandle};
use crate::signal::StopSignal;
use crate::status::{CheckpointPolicy, ServiceState, StatusRecord, TransitionRefused};

pub(crate) const CONTROL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::control");

/// Lifecycle state for one run of the daemon.
pub struct ServiceController {
    status: Mutex<StatusRecord>,
    handle: OnceLock<Arc<dyn StatusHandle>>,
    stop: OnceLock<StopSignal>,
    policy: CheckpointPolicy,
    reporter: Arc<dyn LifecycleReporter>,
}

impl ServiceController {
    /// Creates a controller holding `record` as the current status.
    #[must_use]
    pub fn new(
        record: StatusRecord,
        policy: CheckpointPolicy,
        reporter: Arc<dyn LifecycleReporter>,
    ) -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(record),
            handle: OnceLock::new(),
            stop: OnceLock::new(),
            policy,
            reporter,
        })
    }

    /// Builds the callback handed to the host at registration.
    ///
    /// The callback holds a weak reference: once the run has finished and the
    /// controller is dropped, late control requests are discarded.
    #[must_use]
    pub fn control_handler(self: &Arc<Self>) -> ControlHandler {
        let controller: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |control| match controller.upgrade() {
            Some(controller) => controller.handle_control(control),
            None => debug!(
                target: CONTROL_TARGET,
                %control,
                "control request arrived after the run finished"
            ),
        })
    }

    /// Copy of the current status record.
    #[must_use]
    pub fn snapshot(&self) -> StatusRecord {
        self.lock_status().clone()
    }

    /// Checkpoint policy applied to transitions.
    #[must_use]
    pub const fn policy(&self) -> CheckpointPolicy {
        self.policy
    }

    /// Stores the registration handle. Later calls are ignored.
    pub(crate) fn attach_handle(&self, handle: Arc<dyn StatusHandle>) {
        if self.handle.set(handle).is_err() {
            warn!(target: CONTROL_TARGET, "registration handle already attached");
        }
    }

    /// Stores the stop signal set by accepted stop requests.
    pub(crate) fn attach_stop_signal(&self, signal: StopSignal) {
        if self.stop.set(signal).is_err() {
            warn!(target: CONTROL_TARGET, "stop signal already attached");
        }
    }

    /// Publishes the current record without changing it.
    pub(crate) fn publish_current(&self) -> Result<StatusRecord, LifecycleError> {
        let status = self.lock_status();
        self.publish_locked(&status)
            .map_err(|source| LifecycleError::Publish {
                state: status.state(),
                source,
            })?;
        Ok(status.clone())
    }

    /// Applies `change` and publishes the result.
    ///
    /// A refused transition publishes nothing. When the publish fails the
    /// record is restored to its previous value.
    pub(crate) fn advance<F>(&self, change: F) -> Result<StatusRecord, LifecycleError>
    where
        F: FnOnce(&mut StatusRecord) -> Result<(), TransitionRefused>,
    {
        let mut status = self.lock_status();
        let previous = status.clone();
        change(&mut status).map_err(|source| LifecycleError::Transition { source })?;
        if let Err(source) = self.publish_locked(&status) {
            let state = status.state();
            *status = previous;
            return Err(LifecycleError::Publish { state, source });
        }
        Ok(status.clone())
    }

    /// Reacts to a control request delivered by the host.
    ///
    /// Only [`ServiceControl::Stop`] has an effect; every other request is
    /// reported and ignored.
    pub fn handle_control(&self, control: ServiceControl) {
        match control {
            ServiceControl::Stop => self.request_stop(),
            other => {
                let state = self.lock_status().state();
                self.reporter.control_ignored(other, state);
            }
        }
    }

    fn request_stop(&self) {
        let mut status = self.lock_status();
        if status.state() != ServiceState::Running {
            let state = status.state();
            drop(status);
            self.reporter.control_ignored(ServiceControl::Stop, state);
            return;
        }

        if let Err(refused) = status.enter_stop_pending(self.policy.stop_pending) {
            warn!(target: CONTROL_TARGET, error = %refused, "stop transition refused");
            return;
        }
        if self.publish_locked(&status).is_err() {
            // Swallowed: the record stays STOP_PENDING and the signal unset, so
            // repeated stop requests are no-ops.
            return;
        }
        drop(status);

        self.reporter.stop_requested();
        match self.stop.get() {
            Some(signal) => signal.set(),
            None => warn!(target: CONTROL_TARGET, "stop accepted before the stop signal existed"),
        }
    }

    fn publish_locked(&self, record: &StatusRecord) -> Result<(), PublishError> {
        let result = match self.handle.get() {
            Some(handle) => handle.publish(record),
            None => Err(PublishError::Rejected {
                reason: String::from("no registration handle attached"),
            }),
        };
        match &result {
            Ok(()) => self.reporter.status_published(record),
            Err(error) => self.reporter.publish_failed(record.state(), error),
        }
        result
    }

    fn lock_status(&self) -> MutexGuard<'_, StatusRecord> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
