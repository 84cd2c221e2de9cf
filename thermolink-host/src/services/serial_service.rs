use std::io::{self, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serialport::{DataBits, SerialPortType, StopBits};
use thermolink_api::{DisplayState, LineFramer, Parity, SerialParams};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;

use crate::errors::DeviceError;
use crate::services::SharedDisplay;

const READ_BUFFER_SIZE: usize = 256;
const DEFAULT_PRODUCT_NAME: &str = "USB-Serial";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialDevice {
    pub path: String,
    pub product: Option<String>,
}

impl SerialDevice {
    pub fn new<S: Into<String>>(path: S, product: Option<String>) -> Self {
        Self {
            path: path.into(),
            product,
        }
    }

    pub fn display_name(&self) -> &str {
        self.product.as_deref().unwrap_or(DEFAULT_PRODUCT_NAME)
    }
}

/// Asynchronous notifications delivered to the connection service
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Permission {
        device: Option<SerialDevice>,
        granted: bool,
    },
    ReaderFailed {
        session: u64,
        message: String,
    },
}

/// An open port. Dropping it closes the port.
pub trait SerialLink: Read + Send {}

impl<T: Read + Send + ?Sized> SerialLink for T {}

/// Device enumeration, access control and opening, as provided by the host platform
pub trait SerialHost: Send {
    fn devices(&self) -> Result<Vec<SerialDevice>, DeviceError>;

    fn has_permission(&self, device: &SerialDevice) -> bool;

    /// Ask for access; the answer arrives later as [`HostEvent::Permission`]
    fn request_permission(&self, device: &SerialDevice);

    fn open(
        &self,
        device: &SerialDevice,
        params: &SerialParams,
        timeout: Duration,
    ) -> Result<Box<dyn SerialLink>, DeviceError>;
}

/// Serial ports of the local machine through the `serialport` crate
pub struct SerialportHost {
    port_path: Option<String>,
    events: UnboundedSender<HostEvent>,
}

impl SerialportHost {
    pub fn new(port_path: Option<String>, events: UnboundedSender<HostEvent>) -> Self {
        Self { port_path, events }
    }
}

impl SerialHost for SerialportHost {
    fn devices(&self) -> Result<Vec<SerialDevice>, DeviceError> {
        if let Some(path) = &self.port_path {
            #[cfg(unix)]
            if !std::path::Path::new(path).exists() {
                return Ok(Vec::new());
            }

            return Ok(vec![SerialDevice::new(path.clone(), None)]);
        }

        let ports = serialport::available_ports()
            .map_err(|e| DeviceError::Enumeration(e.description))?;

        Ok(ports
            .into_iter()
            .filter_map(|port| match port.port_type {
                SerialPortType::UsbPort(info) => Some(SerialDevice::new(port.port_name, info.product)),
                _ => None,
            })
            .collect())
    }

    /// Only an access error counts as missing permission. Any other failure
    /// (busy, not a tty, I/O) is left for `open` to report.
    #[cfg(unix)]
    fn has_permission(&self, device: &SerialDevice) -> bool {
        let access = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&device.path);

        match access {
            Ok(_) => true,
            Err(e) => e.kind() != ErrorKind::PermissionDenied,
        }
    }

    #[cfg(not(unix))]
    fn has_permission(&self, _device: &SerialDevice) -> bool {
        true
    }

    fn request_permission(&self, device: &SerialDevice) {
        let granted = self.has_permission(device);

        if !granted {
            tracing::warn!(
                port = %device.path,
                "no read/write access, add the user to the dialout (or uucp) group and retry"
            );
        }

        let _ = self.events.send(HostEvent::Permission {
            device: Some(device.clone()),
            granted,
        });
    }

    fn open(
        &self,
        device: &SerialDevice,
        params: &SerialParams,
        timeout: Duration,
    ) -> Result<Box<dyn SerialLink>, DeviceError> {
        tracing::debug!(port = %device.path, baud = params.baud_rate, "open serial port");

        let port = serialport::new(&device.path, params.baud_rate)
            .data_bits(data_bits(params.data_bits))
            .stop_bits(stop_bits(params.stop_bits))
            .parity(parity(params.parity))
            .timeout(timeout)
            .open()?;

        Ok(Box::new(port))
    }
}

fn data_bits(bits: u8) -> DataBits {
    match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

fn stop_bits(bits: u8) -> StopBits {
    match bits {
        2 => StopBits::Two,
        _ => StopBits::One,
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

pub(crate) fn lock(framer: &Mutex<LineFramer>) -> MutexGuard<'_, LineFramer> {
    framer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Background thread servicing one open port
pub struct ReaderWorker {
    session: u64,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ReaderWorker {
    pub fn spawn(
        session: u64,
        link: Box<dyn SerialLink>,
        framer: Arc<Mutex<LineFramer>>,
        display: SharedDisplay,
        events: UnboundedSender<HostEvent>,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));

        let handle = thread::Builder::new()
            .name(format!("serial-reader-{session}"))
            .spawn({
                let stop = Arc::clone(&stop);
                move || match read_loop(link, &framer, &display, &stop) {
                    Ok(()) => tracing::debug!(session, "serial reader stopped"),
                    Err(e) if stop.load(Ordering::Acquire) => {
                        tracing::debug!(session, error = %e, "serial reader stopped with error");
                    }
                    Err(e) => {
                        tracing::warn!(session, error = %e, "serial reader failed");
                        let _ = events.send(HostEvent::ReaderFailed {
                            session,
                            message: e.to_string(),
                        });
                    }
                }
            })?;

        Ok(Self {
            session,
            stop,
            handle,
        })
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Signal the thread and wait for it; the port is closed when this returns
    pub fn stop(self) {
        self.stop.store(true, Ordering::Release);

        if self.handle.join().is_err() {
            tracing::error!(session = self.session, "serial reader panicked");
        }
    }
}

/// Read until stopped or an I/O error occurs, feeding every chunk through the framer.
///
/// Timeouts only give the loop a chance to observe `stop`. A zero-length read
/// means the device went away.
pub fn read_loop(
    mut link: Box<dyn SerialLink>,
    framer: &Mutex<LineFramer>,
    display: &watch::Sender<DisplayState>,
    stop: &AtomicBool,
) -> io::Result<()> {
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    while !stop.load(Ordering::Acquire) {
        let count = match link.read(&mut buffer) {
            Ok(0) => return Err(io::Error::new(ErrorKind::UnexpectedEof, "device disconnected")),
            Ok(count) => count,
            Err(e) if is_transient(&e) => continue,
            Err(e) => return Err(e),
        };

        let lines = lock(framer).push(&buffer[..count]);
        if lines.is_empty() || stop.load(Ordering::Acquire) {
            continue;
        }

        display.send_modify(|state| {
            for line in &lines {
                tracing::trace!(line = %line, "telemetry line");
                state.handle_line(line);
            }
        });
    }

    Ok(())
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}
