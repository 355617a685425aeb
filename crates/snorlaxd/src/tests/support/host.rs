//! Recording [`ServiceHost`] double that captures every published status.
//!
//! The host keeps the registered control handler so scenarios can deliver
//! control requests from a thread other than the one running the lifecycle,
//! mirroring the host-owned dispatch thread of a real service manager.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::host::{
    ControlHandler, PublishError, RegistrationError, ServiceControl, ServiceHost,
    SignalCreationError, StatusHandle,
};
use crate::signal::StopSignal;
use crate::status::{ServiceState, StatusRecord};

/// A status record accepted by the host, with the time it arrived.
#[derive(Debug, Clone)]
pub struct Published {
    pub at: Instant,
    pub record: StatusRecord,
}

#[derive(Debug, Default)]
struct PublishLog {
    entries: Mutex<Vec<Published>>,
    attempts: Mutex<usize>,
    changed: Condvar,
}

impl PublishLog {
    fn entries(&self) -> MutexGuard<'_, Vec<Published>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Failures the host injects into a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFailures {
    pub registration: bool,
    pub signal_code: Option<u32>,
    pub publish_state: Option<ServiceState>,
}

/// Host double recording registrations, publishes, and the control handler.
#[derive(Default)]
pub struct RecordingHost {
    failures: HostFailures,
    log: Arc<PublishLog>,
    handler: Mutex<Option<ControlHandler>>,
    registered: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failures(failures: HostFailures) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<Published> {
        self.log.entries().clone()
    }

    pub fn records(&self) -> Vec<StatusRecord> {
        self.published().into_iter().map(|entry| entry.record).collect()
    }

    pub fn states(&self) -> Vec<ServiceState> {
        self.records().iter().map(StatusRecord::state).collect()
    }

    pub fn publish_attempts(&self) -> usize {
        *self
            .log
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn registered_names(&self) -> Vec<String> {
        self.registered
            .lock()
            .expect("registration mutex poisoned")
            .clone()
    }

    /// Blocks until a record in `state` has been published.
    pub fn wait_for_state(&self, state: ServiceState, timeout: Duration) -> bool {
        let entries = self.log.entries();
        let (entries, _) = self
            .log
            .changed
            .wait_timeout_while(entries, timeout, |entries| {
                !entries.iter().any(|entry| entry.record.state() == state)
            })
            .expect("publish log mutex poisoned");
        entries.iter().any(|entry| entry.record.state() == state)
    }

    /// Delivers `control` to the registered handler on the calling thread.
    pub fn send_control(&self, control: ServiceControl) {
        let handler = self
            .handler
            .lock()
            .expect("handler mutex poisoned")
            .clone()
            .expect("no control handler registered");
        handler(control);
    }
}

impl ServiceHost for RecordingHost {
    fn register(
        &self,
        name: &str,
        handler: ControlHandler,
    ) -> Result<Arc<dyn StatusHandle>, RegistrationError> {
        if self.failures.registration {
            return Err(RegistrationError::Rejected {
                name: name.to_owned(),
                reason: String::from("service is not installed"),
            });
        }
        self.registered
            .lock()
            .expect("registration mutex poisoned")
            .push(name.to_owned());
        *self.handler.lock().expect("handler mutex poisoned") = Some(handler);
        Ok(Arc::new(RecordingHandle {
            log: Arc::clone(&self.log),
            fail_state: self.failures.publish_state,
        }))
    }

    fn create_stop_signal(&self) -> Result<StopSignal, SignalCreationError> {
        match self.failures.signal_code {
            Some(code) => Err(SignalCreationError::new(code, "event creation refused")),
            None => Ok(StopSignal::new()),
        }
    }
}

struct RecordingHandle {
    log: Arc<PublishLog>,
    fail_state: Option<ServiceState>,
}

impl StatusHandle for RecordingHandle {
    fn publish(&self, record: &StatusRecord) -> Result<(), PublishError> {
        *self
            .log
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        if self.fail_state == Some(record.state()) {
            return Err(PublishError::Rejected {
                reason: format!("{} rejected by test host", record.state()),
            });
        }
        self.log.entries().push(Published {
            at: Instant::now(),
            record: record.clone(),
        });
        self.log.changed.notify_all();
        Ok(())
    }
}
