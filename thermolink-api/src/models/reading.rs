use serde::{Deserialize, Serialize};

use crate::telemetry::TelemetryLine;

/// Latest known values, each field updated independently
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    /// Degrees Celsius
    pub temperature: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<f64>,
}

impl TelemetryReading {
    /// Overwrite only the fields the line carries; returns whether anything changed
    pub fn apply(&mut self, line: &TelemetryLine) -> bool {
        let mut updated = false;

        if let Some(temperature) = line.temperature {
            self.temperature = Some(temperature);
            updated = true;
        }
        if let Some(humidity) = line.humidity {
            self.humidity = Some(humidity);
            updated = true;
        }

        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_full_line() {
        let mut reading = TelemetryReading::default();

        assert!(reading.apply(&TelemetryLine::parse("T=21.5;H=60.2")));
        assert_eq!(reading.temperature, Some(21.5));
        assert_eq!(reading.humidity, Some(60.2));
    }

    #[test]
    fn test_apply_humidity_only_keeps_temperature() {
        let mut reading = TelemetryReading {
            temperature: Some(19.0),
            humidity: Some(40.0),
        };

        reading.apply(&TelemetryLine::parse("H=55"));

        assert_eq!(reading.temperature, Some(19.0));
        assert_eq!(reading.humidity, Some(55.0));
    }

    #[test]
    fn test_apply_unparseable_keeps_stale_value() {
        let mut reading = TelemetryReading {
            temperature: Some(19.0),
            humidity: None,
        };

        assert!(!reading.apply(&TelemetryLine::parse("T=n/a")));
        assert_eq!(reading.temperature, Some(19.0));
    }
}
