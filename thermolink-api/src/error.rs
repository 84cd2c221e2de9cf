use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Baud rate must be non-zero
    InvalidBaudRate(u32),
    /// Data bits outside 5..=8
    InvalidDataBits(u8),
    /// Stop bits outside 1..=2
    InvalidStopBits(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaudRate(baud) => write!(f, "Invalid baud rate: {}", baud),
            Self::InvalidDataBits(bits) => write!(f, "Invalid data bits: {}", bits),
            Self::InvalidStopBits(bits) => write!(f, "Invalid stop bits: {}", bits),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
