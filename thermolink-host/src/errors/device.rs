/// Connection failures, each rendered as the status line shown to the user
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("No USB-Serial device found")]
    NoDevice,

    #[error("Cannot enumerate serial devices: {0}")]
    Enumeration(String),

    #[error("USB permission denied")]
    PermissionDenied,

    #[error("Open failed: {0}")]
    Open(String),

    #[error("Cannot start serial reader: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<serialport::Error> for DeviceError {
    fn from(err: serialport::Error) -> Self {
        DeviceError::Open(err.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(DeviceError::NoDevice.to_string(), "No USB-Serial device found");
        assert_eq!(DeviceError::PermissionDenied.to_string(), "USB permission denied");
        assert_eq!(
            DeviceError::Open("Device or resource busy".into()).to_string(),
            "Open failed: Device or resource busy"
        );
        assert_eq!(
            DeviceError::Io("Broken pipe".into()).to_string(),
            "IO error: Broken pipe"
        );
    }

    #[test]
    fn test_from_serialport_error() {
        let err = serialport::Error::new(serialport::ErrorKind::NoDevice, "gone");

        assert_eq!(DeviceError::from(err).to_string(), "Open failed: gone");
    }
}
