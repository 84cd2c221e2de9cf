use std::sync::Arc;

use crate::app::create_app;
use crate::configs::Settings;

pub mod app;
pub mod configs;
pub mod errors;
pub mod handles;
pub mod services;

pub async fn run(settings: &Arc<Settings>) {
    let app = match create_app(settings) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "invalid serial settings");
            return;
        }
    };

    tracing::info!(
        port = settings.serial.port_path.as_deref().unwrap_or("auto"),
        baud = settings.serial.baud_rate,
        "starting"
    );

    app.run().await;
}
