use std::sync::Arc;

use thermolink_api::DisplayState;
use tokio::sync::watch;

pub mod connection_service;
pub mod location_service;
pub mod serial_service;

/// Display state shared between the reader thread and the render loop
pub type SharedDisplay = Arc<watch::Sender<DisplayState>>;
