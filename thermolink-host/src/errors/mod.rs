pub mod device;
pub mod location;

pub use device::DeviceError;
pub use location::LocationError;
