use std::fmt::Write;

use thermolink_api::DisplayState;

use crate::configs::DisplayFormat;

const MISSING_VALUE: &str = "--.-";
const MISSING_COORDINATE: &str = "--";

pub fn render(state: &DisplayState, format: DisplayFormat) -> String {
    match format {
        DisplayFormat::Text => render_text(state),
        DisplayFormat::Json => render_json(state),
    }
}

/// The single sensor screen as plain text
pub fn render_text(state: &DisplayState) -> String {
    let mut screen = String::new();

    let _ = writeln!(screen, "Status: {}", state.status);
    let _ = writeln!(screen);
    let _ = writeln!(screen, "Temp: {} °C", one_decimal(state.reading.temperature));
    let _ = writeln!(screen, "Hum:  {} %", one_decimal(state.reading.humidity));
    let _ = writeln!(screen);
    let _ = writeln!(screen, "{}", state.location_status);
    let _ = writeln!(screen, "Lat:  {}", coordinate(state.location.map(|l| l.latitude)));
    let _ = writeln!(screen, "Lon:  {}", coordinate(state.location.map(|l| l.longitude)));
    let _ = writeln!(screen);
    let _ = write!(screen, "RAW: {}", state.raw);

    screen
}

/// One JSON object per update
pub fn render_json(state: &DisplayState) -> String {
    serde_json::to_string(state).unwrap_or_else(|e| {
        tracing::error!(error = %e, "cannot serialize display state");
        String::from("{}")
    })
}

/// Halves round away from zero, so `21.25` shows as `21.3`
fn one_decimal(value: Option<f64>) -> String {
    value.map_or_else(
        || MISSING_VALUE.to_string(),
        |v| format!("{:.1}", (v * 10.0).round() / 10.0),
    )
}

fn coordinate(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING_COORDINATE.to_string(), |v| v.to_string())
}
