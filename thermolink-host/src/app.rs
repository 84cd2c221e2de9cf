use std::future::Future;
use std::io::{IsTerminal, Write};
use std::sync::Arc;

use thermolink_api::DisplayState;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::watch;

use crate::configs::{DisplayFormat, Settings};
use crate::handles::screen_handle::render;
use crate::services::connection_service::{ConnectionOptions, ConnectionService};
use crate::services::location_service::{LocationService, provider_from_settings};
use crate::services::serial_service::{HostEvent, SerialportHost};

pub const STARTUP_STATUS: &str = "Plug in the ESP8266 over USB, then press r + Enter if needed";

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

pub struct App {
    connection: ConnectionService,
    location: LocationService,
    events: UnboundedReceiver<HostEvent>,
    display: watch::Receiver<DisplayState>,
    format: DisplayFormat,
}

pub fn create_app(settings: &Arc<Settings>) -> thermolink_api::Result<App> {
    let options = ConnectionOptions {
        params: settings.serial.params()?,
        read_timeout: settings.serial.read_timeout(),
    };

    let (display_tx, display) = watch::channel(DisplayState::default());
    let display_tx = Arc::new(display_tx);
    let (events_tx, events) = mpsc::unbounded_channel();

    let host = SerialportHost::new(settings.serial.port_path.clone(), events_tx.clone());
    let connection = ConnectionService::new(
        Box::new(host),
        options,
        Arc::clone(&display_tx),
        events_tx,
    );

    let location = LocationService::new(
        provider_from_settings(&settings.location),
        Arc::clone(&display_tx),
    );

    display_tx.send_modify(|state| state.set_status(STARTUP_STATUS));

    Ok(App {
        connection,
        location,
        events,
        display,
        format: settings.display.format,
    })
}

impl App {
    /// Run on stdin commands until Ctrl-C
    pub async fn run(self) {
        let stdin = BufReader::new(tokio::io::stdin());

        self.run_until(stdin, async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Run until `shutdown` resolves, `q` is read from `commands`, or the
    /// display channel ends. The connection is paused on the way out.
    pub async fn run_until<R, F>(self, commands: R, shutdown: F)
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        let App {
            mut connection,
            location,
            mut events,
            mut display,
            format,
        } = self;

        location.fetch_once();
        connection.resume();
        print_screen(&mut display, format);

        let mut commands = commands.lines();
        let mut commands_open = true;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(event) = events.recv() => connection.handle_event(event),
                line = commands.next_line(), if commands_open => match line {
                    Ok(Some(line)) => match line.trim() {
                        "r" => {
                            location.fetch_once();
                            connection.resume();
                        }
                        "q" => break,
                        _ => {}
                    },
                    Ok(None) => commands_open = false,
                    Err(e) => {
                        tracing::warn!(error = %e, "command input closed");
                        commands_open = false;
                    }
                },
                changed = display.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    print_screen(&mut display, format);
                }
                _ = &mut shutdown => {
                    tracing::info!("shutting down");
                    break;
                }
            }
        }

        connection.pause();
    }
}

fn print_screen(display: &mut watch::Receiver<DisplayState>, format: DisplayFormat) {
    let screen = render(&display.borrow_and_update(), format);
    let mut stdout = std::io::stdout().lock();

    let result = if format == DisplayFormat::Text && stdout.is_terminal() {
        writeln!(stdout, "{CLEAR_SCREEN}{screen}")
    } else {
        writeln!(stdout, "{screen}")
    };

    if let Err(e) = result.and_then(|_| stdout.flush()) {
        tracing::warn!(error = %e, "cannot write screen");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;
    use crate::configs::{Display, LocationSettings, Logger, Serial};

    fn settings(serial: Serial) -> Arc<Settings> {
        Arc::new(Settings {
            logger: Logger {
                level: "info".to_string(),
            },
            serial: Serial {
                port_path: Some("/nonexistent/ttyUSB9".to_string()),
                ..serial
            },
            location: LocationSettings::default(),
            display: Display::default(),
        })
    }

    #[test]
    fn test_create_app_rejects_invalid_serial_settings() {
        let result = create_app(&settings(Serial {
            baud_rate: 0,
            ..Serial::default()
        }));

        assert_eq!(result.err(), Some(thermolink_api::Error::InvalidBaudRate(0)));
    }

    #[tokio::test]
    async fn test_quit_command_stops_loop() {
        let app = create_app(&settings(Serial::default())).unwrap();

        tokio::time::timeout(
            Duration::from_secs(2),
            app.run_until(&b"x\nq\n"[..], std::future::pending()),
        )
        .await
        .expect("loop did not stop on q");
    }

    #[tokio::test]
    async fn test_shutdown_resolving_later_stops_loop() {
        let app = create_app(&settings(Serial::default())).unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = tx.send(());
        });

        tokio::time::timeout(
            Duration::from_secs(2),
            app.run_until(&b"r\nr\n"[..], async {
                let _ = rx.await;
            }),
        )
        .await
        .expect("loop did not stop on shutdown");
    }
}
