use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use thermolink_api::{Location, Parity, SerialParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Serial {
    pub port_path: Option<String>,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
    pub read_timeout_ms: u64,
}

impl Serial {
    pub fn params(&self) -> thermolink_api::Result<SerialParams> {
        SerialParams::new(self.baud_rate, self.data_bits, self.stop_bits, self.parity)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for Serial {
    fn default() -> Self {
        let params = SerialParams::default();

        Self {
            port_path: None,
            baud_rate: params.baud_rate,
            data_bits: params.data_bits,
            stop_bits: params.stop_bits,
            parity: params.parity,
            read_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationSettings {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationSettings {
    /// Both coordinates are required for a fixed location
    pub fn fixed(&self) -> Option<Location> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location::new(latitude, longitude)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Display {
    pub format: DisplayFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    #[serde(default)]
    pub serial: Serial,
    #[serde(default)]
    pub location: LocationSettings,
    #[serde(default)]
    pub display: Display,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::default().separator("__"))
            .build()?
            .try_deserialize()?;

        settings
            .serial
            .params()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(settings)
    }
}
