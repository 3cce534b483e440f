//! Weather data for Skyboard
//!
//! Domain records, unit conversion, and the pluggable provider capability
//! the widget fetches through. Ships an Open-Meteo provider with reverse
//! geocoded location names.

pub mod convert;
pub mod geocode;
pub mod open_meteo;
pub mod provider;
pub mod types;

pub use open_meteo::OpenMeteoProvider;
pub use provider::{initialize, ProviderSettings, UpdateNotifier, WeatherProvider};
pub use types::*;
