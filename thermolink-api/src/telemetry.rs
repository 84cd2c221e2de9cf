use std::collections::HashMap;

pub const TEMPERATURE_KEY: &str = "T";
pub const HUMIDITY_KEY: &str = "H";
/// Lines starting with this prefix are sensor-reported errors
pub const ERROR_PREFIX: &str = "ERR=";

const FIELD_SEPARATOR: char = ';';
const KEY_VALUE_SEPARATOR: char = '=';

/// Split a `KEY=VALUE;KEY=VALUE` line into trimmed pairs.
///
/// Tokens without `=` are dropped. A repeated key keeps its last value.
pub fn parse_key_values(line: &str) -> HashMap<String, String> {
    line.split(FIELD_SEPARATOR)
        .filter_map(|token| token.split_once(KEY_VALUE_SEPARATOR))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// One parsed telemetry line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryLine {
    pub fields: HashMap<String, String>,
    /// Degrees Celsius, present only when `T` parsed as a number
    pub temperature: Option<f64>,
    /// Percent, present only when `H` parsed as a number
    pub humidity: Option<f64>,
    /// The whole line when it is an `ERR=` line
    pub error: Option<String>,
}

impl TelemetryLine {
    pub fn parse(line: &str) -> Self {
        let fields = parse_key_values(line);

        let temperature = Self::number(&fields, TEMPERATURE_KEY);
        let humidity = Self::number(&fields, HUMIDITY_KEY);
        let error = line.starts_with(ERROR_PREFIX).then(|| line.to_string());

        Self {
            fields,
            temperature,
            humidity,
            error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    fn number(fields: &HashMap<String, String>, key: &str) -> Option<f64> {
        fields.get(key).and_then(|value| parse_number(value))
    }
}

/// Decimal reading as the firmware prints it.
///
/// A trailing `f`/`d` type suffix is tolerated. Non-finite values (`inf`,
/// `NaN`) are rejected so they never reach the screen.
fn parse_number(value: &str) -> Option<f64> {
    let digits = value
        .strip_suffix(|c| matches!(c, 'f' | 'F' | 'd' | 'D'))
        .unwrap_or(value);

    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}
