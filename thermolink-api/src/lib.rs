pub mod error;
pub mod framer;
pub mod models;
pub mod telemetry;

pub use error::{Error, Result};
pub use framer::LineFramer;
pub use models::*;
pub use telemetry::{TelemetryLine, parse_key_values};
