//! Host backed by the systemd service notification protocol.
//!
//! The service manager advertises a datagram socket through `NOTIFY_SOCKET`;
//! its presence is what distinguishes a managed launch from a direct one.
//! Status records become `sd_notify` assignments, and the termination signals
//! systemd sends are translated into control requests on a dedicated
//! listener thread.

use std::env;
use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::net::UnixDatagram;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use signal_hook::iterator::backend::Handle;
use tracing::{debug, warn};

use crate::status::{ServiceState, StatusRecord};

use super::{
    ControlHandler, DispatchError, Dispatcher, HOST_TARGET, PublishError, RegistrationError,
    ServiceControl, ServiceEntry, ServiceHost, StatusHandle,
};

const NOTIFY_SOCKET_ENV: &str = "NOTIFY_SOCKET";
const CONTROL_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGHUP, SIGQUIT];

#[derive(Debug, Clone, PartialEq, Eq)]
enum NotifyAddress {
    Path(PathBuf),
    Abstract(Vec<u8>),
}

/// Destination for service notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifySocket {
    address: NotifyAddress,
}

impl NotifySocket {
    /// Reads the socket advertised by the service manager, if any.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        env::var_os(NOTIFY_SOCKET_ENV).and_then(|raw| Self::parse(&raw))
    }

    /// Parses a `NOTIFY_SOCKET` value; a leading `@` names an abstract socket.
    #[must_use]
    pub fn parse(raw: &OsStr) -> Option<Self> {
        let address = match raw.as_bytes() {
            [] => return None,
            [b'@', name @ ..] => NotifyAddress::Abstract(name.to_vec()),
            _ => NotifyAddress::Path(PathBuf::from(raw)),
        };
        Some(Self { address })
    }

    /// Notification socket at a filesystem path.
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self {
            address: NotifyAddress::Path(path.into()),
        }
    }

    /// Sends one notification datagram.
    pub fn notify(&self, payload: &str) -> io::Result<()> {
        let socket = UnixDatagram::unbound()?;
        match &self.address {
            NotifyAddress::Path(path) => {
                socket.send_to(payload.as_bytes(), path)?;
            }
            NotifyAddress::Abstract(name) => send_abstract(&socket, name, payload)?,
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn send_abstract(socket: &UnixDatagram, name: &[u8], payload: &str) -> io::Result<()> {
    use std::os::linux::net::SocketAddrExt;
    use std::os::unix::net::SocketAddr;

    let address = SocketAddr::from_abstract_name(name)?;
    socket.send_to_addr(payload.as_bytes(), &address)?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn send_abstract(_socket: &UnixDatagram, _name: &[u8], _payload: &str) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "abstract notification sockets require Linux",
    ))
}

/// Renders a status record as newline-separated notify assignments.
pub(crate) fn notify_payload(record: &StatusRecord) -> String {
    let mut lines = vec![format!(
        "STATUS={} (checkpoint {})",
        record.state(),
        record.checkpoint()
    )];
    match record.state() {
        ServiceState::Running => lines.push("READY=1".to_owned()),
        ServiceState::StopPending => lines.push("STOPPING=1".to_owned()),
        ServiceState::Stopped if record.exit_code() != 0 => {
            lines.push(format!("ERRNO={}", record.exit_code()));
        }
        ServiceState::StartPending | ServiceState::Stopped => {}
    }
    if record.state().is_pending() {
        lines.push(format!(
            "EXTEND_TIMEOUT_USEC={}",
            record.wait_hint().as_micros()
        ));
    }
    lines.join("\n")
}

/// Maps a delivered signal onto the control taxonomy.
pub(crate) const fn control_for_signal(signal: i32) -> ServiceControl {
    match signal {
        SIGTERM | SIGINT => ServiceControl::Stop,
        SIGQUIT => ServiceControl::Shutdown,
        SIGHUP => ServiceControl::ParamChange,
        other => ServiceControl::Other(other.unsigned_abs()),
    }
}

/// [`ServiceHost`] speaking the systemd notification protocol.
#[derive(Debug, Clone)]
pub struct SystemdHost {
    notify: Arc<NotifySocket>,
}

impl SystemdHost {
    /// Builds a host that notifies `notify`.
    #[must_use]
    pub fn new(notify: NotifySocket) -> Self {
        Self {
            notify: Arc::new(notify),
        }
    }
}

impl ServiceHost for SystemdHost {
    fn register(
        &self,
        name: &str,
        handler: ControlHandler,
    ) -> Result<Arc<dyn StatusHandle>, RegistrationError> {
        let listener_error = |source: io::Error| RegistrationError::ControlListener {
            name: name.to_owned(),
            source,
        };
        let mut signals = Signals::new(CONTROL_SIGNALS).map_err(listener_error)?;
        let close = signals.handle();
        let thread = thread::Builder::new()
            .name(format!("{name}-control"))
            .spawn(move || {
                for signal in signals.forever() {
                    let control = control_for_signal(signal);
                    debug!(
                        target: HOST_TARGET,
                        signal,
                        %control,
                        "delivering control request"
                    );
                    handler(control);
                }
            })
            .map_err(|source| {
                close.close();
                listener_error(source)
            })?;
        debug!(target: HOST_TARGET, service = name, "control handler registered");
        Ok(Arc::new(SystemdStatusHandle {
            notify: Arc::clone(&self.notify),
            close,
            listener: Mutex::new(Some(thread)),
        }))
    }
}

/// Registration handle returned by [`SystemdHost`].
///
/// Dropping the handle stops the control listener thread.
pub struct SystemdStatusHandle {
    notify: Arc<NotifySocket>,
    close: Handle,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for SystemdStatusHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemdStatusHandle")
            .field("notify", &self.notify)
            .finish_non_exhaustive()
    }
}

impl StatusHandle for SystemdStatusHandle {
    fn publish(&self, record: &StatusRecord) -> Result<(), PublishError> {
        let payload = notify_payload(record);
        self.notify
            .notify(&payload)
            .map_err(|source| PublishError::Delivery { source })?;
        debug!(target: HOST_TARGET, state = %record.state(), "status notification sent");
        Ok(())
    }
}

impl Drop for SystemdStatusHandle {
    fn drop(&mut self) {
        self.close.close();
        let listener = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(listener) = listener else {
            return;
        };
        // The last reference can be released by a handler running on the
        // listener thread itself, which must not join itself.
        if listener.thread().id() == thread::current().id() {
            return;
        }
        if listener.join().is_err() {
            warn!(target: HOST_TARGET, "control listener thread panicked");
        }
    }
}

/// [`Dispatcher`] that requires a systemd notification socket.
#[derive(Debug, Clone, Default)]
pub struct SystemdDispatcher {
    notify: Option<NotifySocket>,
}

impl SystemdDispatcher {
    /// Builds a dispatcher from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(NotifySocket::from_env())
    }

    /// Builds a dispatcher for an explicit socket; `None` means unmanaged.
    #[must_use]
    pub const fn new(notify: Option<NotifySocket>) -> Self {
        Self { notify }
    }
}

impl Dispatcher for SystemdDispatcher {
    type Host = SystemdHost;

    fn dispatch(&self, entry: ServiceEntry<SystemdHost>) -> Result<(), DispatchError> {
        let Some(notify) = self.notify.clone() else {
            return Err(DispatchError::NotManaged);
        };
        debug!(target: HOST_TARGET, service = entry.name(), "dispatching service entry");
        let host = SystemdHost::new(notify);
        let (name, main) = entry.into_parts();
        let service = thread::Builder::new()
            .name(name.clone())
            .spawn(move || main(&host))
            .map_err(|source| DispatchError::Spawn {
                name: name.clone(),
                source,
            })?;
        service
            .join()
            .map_err(|_| DispatchError::EntryPointPanicked { name })
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;
    use std::os::unix::net::UnixDatagram;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    struct Listener {
        _dir: TempDir,
        socket: UnixDatagram,
        path: PathBuf,
    }

    impl Listener {
        fn recv(&self) -> String {
            let mut buffer = [0_u8; 512];
            let len = self.socket.recv(&mut buffer).expect("notification expected");
            String::from_utf8_lossy(buffer.get(..len).expect("length within buffer")).into_owned()
        }
    }

    #[fixture]
    fn listener() -> Listener {
        let dir = TempDir::new().expect("temporary directory");
        let path = dir.path().join("notify.sock");
        let socket = UnixDatagram::bind(&path).expect("bind notify socket");
        socket
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set read timeout");
        Listener {
            _dir: dir,
            socket,
            path,
        }
    }

    fn record_in(state: ServiceState) -> StatusRecord {
        let mut record = StatusRecord::start_pending(Duration::from_millis(500));
        if state >= ServiceState::Running {
            record.enter_running().expect("running");
        }
        if state >= ServiceState::StopPending {
            record.enter_stop_pending(4).expect("stop pending");
        }
        if state >= ServiceState::Stopped {
            record.enter_stopped(3).expect("stopped");
        }
        record
    }

    #[rstest]
    #[case("", None)]
    #[case("/run/systemd/notify", Some(NotifySocket::path("/run/systemd/notify")))]
    #[case(
        "@/org/freedesktop/systemd1/notify",
        Some(NotifySocket { address: NotifyAddress::Abstract(b"/org/freedesktop/systemd1/notify".to_vec()) })
    )]
    fn parses_notify_socket_values(#[case] raw: &str, #[case] expected: Option<NotifySocket>) {
        assert_eq!(NotifySocket::parse(OsStr::new(raw)), expected);
    }

    #[rstest]
    #[case(
        ServiceState::StartPending,
        "STATUS=start_pending (checkpoint 0)\nEXTEND_TIMEOUT_USEC=500000"
    )]
    #[case(ServiceState::Running, "STATUS=running (checkpoint 0)\nREADY=1")]
    #[case(
        ServiceState::StopPending,
        "STATUS=stop_pending (checkpoint 4)\nSTOPPING=1\nEXTEND_TIMEOUT_USEC=500000"
    )]
    #[case(ServiceState::Stopped, "STATUS=stopped (checkpoint 3)")]
    fn renders_notify_payloads(#[case] state: ServiceState, #[case] expected: &str) {
        assert_eq!(notify_payload(&record_in(state)), expected);
    }

    #[rstest]
    fn failed_start_reports_errno() {
        let mut record = StatusRecord::start_pending(Duration::from_millis(500));
        record.fail_start(12, 1).expect("failed start");
        assert_eq!(
            notify_payload(&record),
            "STATUS=stopped (checkpoint 1)\nERRNO=12"
        );
    }

    #[rstest]
    #[case(SIGTERM, ServiceControl::Stop)]
    #[case(SIGINT, ServiceControl::Stop)]
    #[case(SIGQUIT, ServiceControl::Shutdown)]
    #[case(SIGHUP, ServiceControl::ParamChange)]
    fn maps_signals_to_controls(#[case] signal: i32, #[case] expected: ServiceControl) {
        assert_eq!(control_for_signal(signal), expected);
    }

    #[rstest]
    fn notify_delivers_datagram(listener: Listener) {
        NotifySocket::path(&listener.path)
            .notify("READY=1")
            .expect("notification should send");
        assert_eq!(listener.recv(), "READY=1");
    }

    #[rstest]
    fn notify_to_missing_socket_fails() {
        let dir = TempDir::new().expect("temporary directory");
        let socket = NotifySocket::path(dir.path().join("absent.sock"));
        assert!(socket.notify("READY=1").is_err());
    }

    #[rstest]
    fn registered_handle_publishes_and_stops_listener(listener: Listener) {
        let host = SystemdHost::new(NotifySocket::path(&listener.path));
        let handler: ControlHandler = Arc::new(|_control| {});
        let handle = host
            .register("snorlax-test", handler)
            .expect("registration should succeed");

        handle
            .publish(&record_in(ServiceState::Running))
            .expect("publish should succeed");
        assert_eq!(listener.recv(), "STATUS=running (checkpoint 0)\nREADY=1");

        drop(handle);
    }

    #[rstest]
    fn dispatch_without_socket_is_not_managed() {
        let dispatcher = SystemdDispatcher::new(None);
        let error = dispatcher
            .dispatch(ServiceEntry::new("SnorlaxSvc", |_host: &SystemdHost| {}))
            .expect_err("dispatch must fail without a notify socket");
        assert!(matches!(error, DispatchError::NotManaged));
    }

    #[rstest]
    fn dispatch_runs_entry_on_named_thread(listener: Listener) {
        let dispatcher = SystemdDispatcher::new(Some(NotifySocket::path(&listener.path)));
        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        dispatcher
            .dispatch(ServiceEntry::new("SnorlaxSvc", move |_host: &SystemdHost| {
                let name = thread::current().name().map(str::to_owned);
                *sink.lock().expect("sink mutex poisoned") = name;
            }))
            .expect("dispatch should succeed");
        let name = observed.lock().expect("sink mutex poisoned").clone();
        assert_eq!(name.as_deref(), Some("SnorlaxSvc"));
    }

    #[rstest]
    fn dispatch_reports_panicking_entry(listener: Listener) {
        let dispatcher = SystemdDispatcher::new(Some(NotifySocket::path(&listener.path)));
        let error = dispatcher
            .dispatch(ServiceEntry::new("SnorlaxSvc", |_host: &SystemdHost| {
                panic!("entry point failure");
            }))
            .expect_err("panics must surface");
        assert!(matches!(error, DispatchError::EntryPointPanicked { .. }));
    }
}
