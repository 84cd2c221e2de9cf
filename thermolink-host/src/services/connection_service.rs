use std::sync::{Arc, Mutex};
use std::time::Duration;

use thermolink_api::{LineFramer, SerialParams};
use tokio::sync::mpsc::UnboundedSender;

use crate::errors::DeviceError;
use crate::services::SharedDisplay;
use crate::services::serial_service::{
    HostEvent, ReaderWorker, SerialDevice, SerialHost, SerialLink, lock,
};

pub const REQUESTING_PERMISSION_STATUS: &str = "Requesting USB permission…";
pub const PERMISSION_GRANTED_STATUS: &str = "USB permission granted, opening…";

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Idle,
    RequestingPermission,
    Connected { device: SerialDevice },
    IoError(String),
    Closed,
}

#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub params: SerialParams,
    pub read_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            params: SerialParams::default(),
            read_timeout: Duration::from_millis(100),
        }
    }
}

/// Owns the serial connection lifecycle.
///
/// `Idle` and `Connected` are the only resting states. Permission requests,
/// I/O errors and closes pass through their state and settle back in `Idle`.
/// Every `resume` is a fresh attempt; nothing retries on its own.
pub struct ConnectionService {
    host: Box<dyn SerialHost>,
    options: ConnectionOptions,
    display: SharedDisplay,
    events: UnboundedSender<HostEvent>,
    framer: Arc<Mutex<LineFramer>>,
    state: ConnectionState,
    worker: Option<ReaderWorker>,
    sessions: u64,
}

impl ConnectionService {
    pub fn new(
        host: Box<dyn SerialHost>,
        options: ConnectionOptions,
        display: SharedDisplay,
        events: UnboundedSender<HostEvent>,
    ) -> Self {
        Self {
            host,
            options,
            display,
            events,
            framer: Arc::new(Mutex::new(LineFramer::new())),
            state: ConnectionState::Idle,
            worker: None,
            sessions: 0,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }

    /// Partial line buffered by the framer
    pub fn pending_line(&self) -> String {
        lock(&self.framer).pending().to_string()
    }

    /// Try to open the first available device; a no-op while connected
    pub fn resume(&mut self) {
        if self.is_connected() {
            tracing::debug!("already connected, resume ignored");
            return;
        }

        if let Err(e) = self.open_first_device() {
            tracing::info!(error = %e, "serial device not opened");
            self.set_status(e.to_string());
        }
    }

    /// Stop the reader, close the port and drop any partial line
    pub fn pause(&mut self) {
        if self.teardown() {
            self.enter(ConnectionState::Closed);
        }
        self.enter(ConnectionState::Idle);
    }

    pub fn on_permission_result(&mut self, device: Option<SerialDevice>, granted: bool) {
        if self.is_connected() {
            tracing::debug!(granted, "permission result while connected, ignored");
            return;
        }

        match device {
            Some(device) if granted => {
                tracing::info!(port = %device.path, "serial permission granted");
                self.set_status(PERMISSION_GRANTED_STATUS);
                self.resume();
            }
            _ => self.set_status(DeviceError::PermissionDenied.to_string()),
        }
    }

    pub fn on_reader_failed(&mut self, session: u64, message: String) {
        if self.worker.as_ref().map(ReaderWorker::session) != Some(session) {
            tracing::debug!(session, "stale reader failure ignored");
            return;
        }

        self.teardown();
        self.set_status(DeviceError::Io(message.clone()).to_string());
        self.enter(ConnectionState::IoError(message));
        self.enter(ConnectionState::Idle);
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Permission { device, granted } => self.on_permission_result(device, granted),
            HostEvent::ReaderFailed { session, message } => self.on_reader_failed(session, message),
        }
    }

    fn open_first_device(&mut self) -> Result<(), DeviceError> {
        let device = self
            .host
            .devices()?
            .into_iter()
            .next()
            .ok_or(DeviceError::NoDevice)?;

        if !self.host.has_permission(&device) {
            self.set_status(REQUESTING_PERMISSION_STATUS);
            self.enter(ConnectionState::RequestingPermission);
            self.host.request_permission(&device);
            self.enter(ConnectionState::Idle);
            return Ok(());
        }

        let link = self
            .host
            .open(&device, &self.options.params, self.options.read_timeout)?;

        self.start_reader(device, link)
    }

    fn start_reader(
        &mut self,
        device: SerialDevice,
        link: Box<dyn SerialLink>,
    ) -> Result<(), DeviceError> {
        lock(&self.framer).reset();
        self.sessions += 1;

        // Status first so an early sensor error line is not overwritten
        self.set_status(format!("Connected: {}", device.display_name()));

        let worker = ReaderWorker::spawn(
            self.sessions,
            link,
            Arc::clone(&self.framer),
            Arc::clone(&self.display),
            self.events.clone(),
        )
        .map_err(|e| DeviceError::Worker(e.to_string()))?;

        tracing::info!(port = %device.path, session = worker.session(), "serial device connected");

        self.worker = Some(worker);
        self.enter(ConnectionState::Connected { device });

        Ok(())
    }

    /// Returns whether a reader was running
    fn teardown(&mut self) -> bool {
        let stopped = match self.worker.take() {
            Some(worker) => {
                worker.stop();
                true
            }
            None => false,
        };

        lock(&self.framer).reset();

        stopped
    }

    fn enter(&mut self, next: ConnectionState) {
        tracing::debug!(from = ?self.state, to = ?next, "connection state");
        self.state = next;
    }

    fn set_status<S: Into<String>>(&self, status: S) {
        let status = status.into();
        self.display.send_modify(|state| state.set_status(status));
    }
}

impl Drop for ConnectionService {
    fn drop(&mut self) {
        self.teardown();
    }
}
