use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use time::OffsetDateTime;
use tokio::{signal, time as tokio_time};

use crate::settings::{Mock, Settings};
use crate::simulate::{simulated_humidity, simulated_temperature};

pub mod settings;
mod simulate;

const SECONDS_PER_DAY: f64 = 86_400.0;

pub async fn run(settings: &Arc<Settings>) {
    let mock = &settings.mock;

    let mut sink = match open_sink(mock) {
        Ok(sink) => sink,
        Err(e) => {
            tracing::error!(error = %e, "cannot open output");
            return;
        }
    };

    let mut interval = tokio_time::interval(Duration::from_millis(mock.interval_ms));
    let mut index: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                index += 1;

                let line = next_line(mock, index, day_fraction(OffsetDateTime::now_utc()));
                tracing::debug!("Send: {}", line);

                if let Err(e) = write!(sink, "{line}\r\n").and_then(|_| sink.flush()) {
                    tracing::error!(error = %e, "write failed");
                    break;
                }
            }
            _ = signal::ctrl_c() => break,
        }
    }
}

fn open_sink(mock: &Mock) -> io::Result<Box<dyn Write + Send>> {
    match &mock.port_path {
        Some(path) => {
            tracing::info!(port = %path, baud = mock.baud_rate, "writing to serial port");

            let port = serialport::new(path, mock.baud_rate)
                .open()
                .map_err(io::Error::from)?;

            Ok(Box::new(port))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

/// The `index`-th line the device would print
pub fn next_line(mock: &Mock, index: u64, day_fraction: f64) -> String {
    if mock.error_every > 0 && index % mock.error_every == 0 {
        return format!("ERR={}", mock.error_text);
    }

    let mut rng = rand::thread_rng();
    let temperature = simulated_temperature(day_fraction) + rng.gen_range(-0.2..0.2);
    let humidity = (simulated_humidity(day_fraction) + rng.gen_range(-1.0..1.0)).clamp(0.0, 100.0);

    format_reading(temperature, humidity)
}

pub fn format_reading(temperature: f64, humidity: f64) -> String {
    format!("T={temperature:.2};H={humidity:.2}")
}

fn day_fraction(now: OffsetDateTime) -> f64 {
    let (hours, minutes, seconds) = now.to_hms();
    let elapsed = u32::from(hours) * 3600 + u32::from(minutes) * 60 + u32::from(seconds);

    f64::from(elapsed) / SECONDS_PER_DAY
}
