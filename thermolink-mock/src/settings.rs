use std::error::Error;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Mock {
    /// Write to this serial port instead of stdout
    pub port_path: Option<String>,
    pub baud_rate: u32,
    pub interval_ms: u64,
    /// Emit an error line every N lines, 0 never
    pub error_every: u64,
    pub error_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub mock: Mock,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let settings: Settings = toml::from_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))?;

        if settings.mock.interval_ms == 0 {
            return Err("mock.interval_ms must be positive".into());
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::new().unwrap();

        assert_eq!(settings.mock.port_path, None);
        assert_eq!(settings.mock.baud_rate, 115_200);
        assert_eq!(settings.mock.interval_ms, 2000);
        assert_eq!(settings.mock.error_every, 0);
    }
}
