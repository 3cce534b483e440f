use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::open_meteo::OpenMeteoProvider;
use crate::types::{WeatherEntry, WeatherError, WeatherOverride};

/// Callback a provider invokes whenever freshly fetched data is readable.
#[derive(Clone)]
pub struct UpdateNotifier {
    inner: Arc<dyn Fn() + Send + Sync>,
}

impl UpdateNotifier {
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self { inner: Arc::new(f) }
    }

    pub fn notify(&self) {
        (self.inner)();
    }
}

impl fmt::Debug for UpdateNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateNotifier").finish_non_exhaustive()
    }
}

/// Source of weather records consumed by the widget.
///
/// Fetch methods only start work; completion is reported through the
/// [`UpdateNotifier`] handed to [`WeatherProvider::start`]. Failed fetches are
/// the provider's concern and simply never notify.
pub trait WeatherProvider: Send {
    /// Name reported in outbound notifications
    fn provider_name(&self) -> &str;

    /// Called once before the first fetch
    fn start(&mut self, notifier: UpdateNotifier);

    fn fetch_current_weather(&mut self);

    fn fetch_weather_forecast(&mut self);

    fn fetch_weather_hourly(&mut self);

    /// Latest current conditions, if any have been fetched
    fn current_weather(&self) -> Option<WeatherEntry>;

    /// Latest daily forecast; empty until fetched
    fn weather_forecast(&self) -> Vec<WeatherEntry>;

    /// Latest hourly forecast, unsampled; empty until fetched
    fn weather_hourly(&self) -> Vec<WeatherEntry>;

    /// Display name of the location the data was fetched for
    fn fetched_location(&self) -> Option<String>;

    /// Apply values pushed in by another module
    fn apply_override(&mut self, payload: WeatherOverride) {
        tracing::debug!(
            "Provider {} ignores current weather override: {:?}",
            self.provider_name(),
            payload
        );
    }
}

const DEFAULT_API_BASE: &str = "https://api.open-meteo.com";
const DEFAULT_GEOCODE_BASE: &str = "https://nominatim.openstreetmap.org";

/// Settings shared by every provider implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub latitude: f64,
    pub longitude: f64,

    /// Fixed location name; reverse geocoded when absent
    #[serde(default)]
    pub location_name: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_geocode_base")]
    pub geocode_base: String,

    /// Days requested from daily forecast endpoints
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_geocode_base() -> String {
    DEFAULT_GEOCODE_BASE.to_string()
}

fn default_forecast_days() -> u32 {
    7
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            latitude: 52.52,
            longitude: 13.41,
            location_name: None,
            api_base: default_api_base(),
            geocode_base: default_geocode_base(),
            forecast_days: default_forecast_days(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Build the provider registered under `name` (case-insensitive).
pub fn initialize(
    name: &str,
    settings: ProviderSettings,
) -> Result<Box<dyn WeatherProvider>, WeatherError> {
    match name.to_lowercase().as_str() {
        "openmeteo" | "open-meteo" => Ok(Box::new(OpenMeteoProvider::new(settings)?)),
        _ => Err(WeatherError::UnknownProvider(name.to_string())),
    }
}
