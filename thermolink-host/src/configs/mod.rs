pub mod settings;

pub use settings::{Display, DisplayFormat, LocationSettings, Logger, Serial, Settings};
