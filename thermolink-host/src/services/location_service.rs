use thermolink_api::Location;

use crate::configs::LocationSettings;
use crate::errors::LocationError;
use crate::services::SharedDisplay;

pub const LOCATION_DISABLED_STATUS: &str = "Location: disabled in settings";
pub const LOCATION_FETCHING_STATUS: &str = "Location: fetching…";
pub const LOCATION_WAITING_STATUS: &str = "Location: waiting for fix…";
pub const LOCATION_OK_STATUS: &str = "Location: OK";
pub const LOCATION_NULL_STATUS: &str = "Location: null";

pub trait LocationProvider: Send + Sync {
    fn is_enabled(&self) -> bool;

    /// One-shot fetch; `None` means no fix is cached yet
    fn current_location(&self) -> Result<Option<Location>, LocationError>;

    /// Wait for a single fresh fix
    fn request_single_update(&self) -> Result<Option<Location>, LocationError>;
}

/// Reports coordinates configured in settings
pub struct FixedLocationProvider {
    location: Location,
}

impl FixedLocationProvider {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl LocationProvider for FixedLocationProvider {
    fn is_enabled(&self) -> bool {
        true
    }

    fn current_location(&self) -> Result<Option<Location>, LocationError> {
        Ok(Some(self.location))
    }

    fn request_single_update(&self) -> Result<Option<Location>, LocationError> {
        Ok(Some(self.location))
    }
}

pub struct DisabledLocationProvider;

impl LocationProvider for DisabledLocationProvider {
    fn is_enabled(&self) -> bool {
        false
    }

    fn current_location(&self) -> Result<Option<Location>, LocationError> {
        Err(LocationError::Unavailable)
    }

    fn request_single_update(&self) -> Result<Option<Location>, LocationError> {
        Err(LocationError::Unavailable)
    }
}

pub fn provider_from_settings(settings: &LocationSettings) -> Box<dyn LocationProvider> {
    match settings.fixed() {
        Some(location) => Box::new(FixedLocationProvider::new(location)),
        None => Box::new(DisabledLocationProvider),
    }
}

pub struct LocationService {
    provider: Box<dyn LocationProvider>,
    display: SharedDisplay,
}

impl LocationService {
    pub fn new(provider: Box<dyn LocationProvider>, display: SharedDisplay) -> Self {
        Self { provider, display }
    }

    /// Fetch once, falling back to a single update when nothing is cached
    pub fn fetch_once(&self) {
        if !self.provider.is_enabled() {
            self.display.send_modify(|state| {
                state.set_location_status(LOCATION_DISABLED_STATUS);
                state.location = None;
            });
            return;
        }

        self.set_status(LOCATION_FETCHING_STATUS);

        match self.provider.current_location() {
            Ok(Some(location)) => self.store(location),
            Ok(None) => self.request_single_update(),
            Err(e) => {
                tracing::warn!(error = %e, "location fetch failed");
                self.set_status(format!("Location error: {}", e));
            }
        }
    }

    fn request_single_update(&self) {
        self.set_status(LOCATION_WAITING_STATUS);

        match self.provider.request_single_update() {
            Ok(location) => self.display.send_modify(|state| {
                state.location = location;
                state.set_location_status(match location {
                    Some(_) => LOCATION_OK_STATUS,
                    None => LOCATION_NULL_STATUS,
                });
            }),
            Err(e) => {
                tracing::warn!(error = %e, "location update failed");
                self.set_status(format!("Location updates error: {}", e));
            }
        }
    }

    fn store(&self, location: Location) {
        tracing::debug!(latitude = location.latitude, longitude = location.longitude, "location");

        self.display.send_modify(|state| {
            state.location = Some(location);
            state.set_location_status(LOCATION_OK_STATUS);
        });
    }

    fn set_status<S: Into<String>>(&self, status: S) {
        let status = status.into();
        self.display.send_modify(|state| state.set_location_status(status));
    }
}
