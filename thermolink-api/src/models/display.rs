use serde::Serialize;
use time::OffsetDateTime;

use crate::models::{Location, TelemetryReading};
use crate::telemetry::TelemetryLine;

pub const IDLE_STATUS: &str = "Idle";
pub const LOCATION_IDLE_STATUS: &str = "Location: idle";

/// Everything the screen shows, overwritten field by field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayState {
    pub status: String,
    pub reading: TelemetryReading,
    /// Last complete line, verbatim
    pub raw: String,
    pub location_status: String,
    pub location: Option<Location>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
    pub lines_received: u64,
}

impl DisplayState {
    /// Record a complete line and apply whatever it carries
    pub fn handle_line(&mut self, line: &str) -> TelemetryLine {
        self.raw = line.to_string();
        self.lines_received += 1;
        self.last_update = Some(OffsetDateTime::now_utc());

        let parsed = TelemetryLine::parse(line);
        self.reading.apply(&parsed);

        if let Some(error) = &parsed.error {
            self.status = format!("Sensor error: {}", error);
        }

        parsed
    }

    pub fn set_status<S: Into<String>>(&mut self, status: S) {
        self.status = status.into();
    }

    pub fn set_location_status<S: Into<String>>(&mut self, status: S) {
        self.location_status = status.into();
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            status: IDLE_STATUS.to_string(),
            reading: TelemetryReading::default(),
            raw: String::new(),
            location_status: LOCATION_IDLE_STATUS.to_string(),
            location: None,
            last_update: None,
            lines_received: 0,
        }
    }
}
