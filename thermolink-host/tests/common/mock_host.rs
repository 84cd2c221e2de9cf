use std::io::{self, ErrorKind, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thermolink_api::{DisplayState, SerialParams};
use thermolink_host::errors::DeviceError;
use thermolink_host::services::SharedDisplay;
use thermolink_host::services::connection_service::{ConnectionOptions, ConnectionService};
use thermolink_host::services::serial_service::{HostEvent, SerialDevice, SerialHost, SerialLink};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::watch;

pub const DEVICE_PATH: &str = "/dev/ttyUSB0";
pub const DEVICE_NAME: &str = "ESP8266";

#[derive(Default)]
struct HostState {
    devices: Vec<SerialDevice>,
    permitted: bool,
    grant_on_request: bool,
    open_error: Option<String>,
    permission_requests: usize,
    opens: usize,
    link: Option<Sender<io::Result<Vec<u8>>>>,
}

/// In-memory serial host. Clones share state so a test can drive the
/// device after handing a copy to the connection service.
#[derive(Clone)]
pub struct MockHost {
    state: Arc<Mutex<HostState>>,
    events: UnboundedSender<HostEvent>,
}

impl MockHost {
    pub fn new(events: UnboundedSender<HostEvent>) -> Self {
        let state = HostState {
            devices: vec![SerialDevice::new(DEVICE_PATH, Some(DEVICE_NAME.to_string()))],
            permitted: true,
            grant_on_request: true,
            ..Default::default()
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            events,
        }
    }

    pub fn without_devices(self) -> Self {
        self.state.lock().unwrap().devices.clear();
        self
    }

    pub fn without_permission(self, grant_on_request: bool) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.permitted = false;
            state.grant_on_request = grant_on_request;
        }
        self
    }

    pub fn with_open_error(self, message: &str) -> Self {
        self.state.lock().unwrap().open_error = Some(message.to_string());
        self
    }

    pub fn permission_requests(&self) -> usize {
        self.state.lock().unwrap().permission_requests
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    /// Bytes the device "sends" on the currently open link
    pub fn send(&self, bytes: &[u8]) {
        self.push(Ok(bytes.to_vec()));
    }

    pub fn fail(&self, message: &str) {
        self.push(Err(io::Error::new(ErrorKind::Other, message.to_string())));
    }

    fn push(&self, read: io::Result<Vec<u8>>) {
        let state = self.state.lock().unwrap();
        let link = state.link.as_ref().expect("no open link");
        link.send(read).expect("link closed");
    }
}

impl SerialHost for MockHost {
    fn devices(&self) -> Result<Vec<SerialDevice>, DeviceError> {
        Ok(self.state.lock().unwrap().devices.clone())
    }

    fn has_permission(&self, _device: &SerialDevice) -> bool {
        self.state.lock().unwrap().permitted
    }

    fn request_permission(&self, device: &SerialDevice) {
        let granted = {
            let mut state = self.state.lock().unwrap();
            state.permission_requests += 1;
            state.permitted = state.grant_on_request;
            state.grant_on_request
        };

        let _ = self.events.send(HostEvent::Permission {
            device: Some(device.clone()),
            granted,
        });
    }

    fn open(
        &self,
        _device: &SerialDevice,
        _params: &SerialParams,
        timeout: Duration,
    ) -> Result<Box<dyn SerialLink>, DeviceError> {
        let mut state = self.state.lock().unwrap();

        if let Some(message) = &state.open_error {
            return Err(DeviceError::Open(message.clone()));
        }

        let (tx, rx) = mpsc::channel();
        state.link = Some(tx);
        state.opens += 1;

        Ok(Box::new(ChannelLink { rx, timeout }))
    }
}

struct ChannelLink {
    rx: Receiver<io::Result<Vec<u8>>>,
    timeout: Duration,
}

impl Read for ChannelLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(Ok(bytes)) => {
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            Ok(Err(e)) => Err(e),
            Err(RecvTimeoutError::Timeout) => Err(io::Error::new(ErrorKind::TimedOut, "timed out")),
            Err(RecvTimeoutError::Disconnected) => {
                Err(io::Error::new(ErrorKind::BrokenPipe, "host dropped"))
            }
        }
    }
}

pub struct MockApp {
    pub host: MockHost,
    pub service: ConnectionService,
    pub display: SharedDisplay,
    pub events: UnboundedReceiver<HostEvent>,
}

impl MockApp {
    pub fn new() -> Self {
        Self::with_host(|host| host)
    }

    pub fn with_host<F: FnOnce(MockHost) -> MockHost>(configure: F) -> Self {
        let (events_tx, events) = unbounded_channel();
        let display = Arc::new(watch::channel(DisplayState::default()).0);
        let host = configure(MockHost::new(events_tx.clone()));

        let options = ConnectionOptions {
            read_timeout: Duration::from_millis(10),
            ..Default::default()
        };

        let service = ConnectionService::new(
            Box::new(host.clone()),
            options,
            Arc::clone(&display),
            events_tx,
        );

        Self {
            host,
            service,
            display,
            events,
        }
    }

    pub fn status(&self) -> String {
        self.display.borrow().status.clone()
    }

    /// Wait until the display satisfies `predicate`
    pub async fn wait_for<F: FnMut(&DisplayState) -> bool>(&self, predicate: F) {
        let mut rx = self.display.subscribe();

        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .expect("display did not update in time")
            .expect("display channel closed");
    }

    /// Next host event, handed straight to the service
    pub async fn dispatch_next_event(&mut self) -> HostEvent {
        let event = tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("no host event in time")
            .expect("event channel closed");

        self.service.handle_event(event.clone());
        event
    }

    pub async fn wait_for_pending(&self, pending: &str) {
        for _ in 0..200 {
            if self.service.pending_line() == pending {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("framer never buffered {pending:?}");
    }
}
