use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Unit system used for temperatures, precipitation and the outbound payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    /// Kelvin temperatures, otherwise metric
    Standard,
}

impl Units {
    /// Letter appended to temperatures when a degree label is requested
    pub fn degree_letter(&self) -> &'static str {
        match self {
            Self::Metric => "C",
            Self::Imperial => "F",
            Self::Standard => "K",
        }
    }
}

/// Wind speed display unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindUnits {
    /// Meters per second
    #[default]
    Metric,
    /// Miles per hour
    Imperial,
    Kmh,
    Beaufort,
    Knots,
}

impl From<Units> for WindUnits {
    fn from(units: Units) -> Self {
        match units {
            Units::Imperial => Self::Imperial,
            Units::Metric | Units::Standard => Self::Metric,
        }
    }
}

/// Unit a precipitation amount is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrecipitationUnit {
    #[default]
    Mm,
    Cm,
    In,
}

impl PrecipitationUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Mm => "mm",
            Self::Cm => "cm",
            Self::In => "in",
        }
    }
}

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Weather-icons class name, day or night variant.
    pub fn weather_type(&self, is_day: bool) -> &'static str {
        match (self, is_day) {
            (Self::Clear, true) => "day-sunny",
            (Self::Clear, false) => "night-clear",
            (Self::PartlyCloudy, true) => "day-cloudy",
            (Self::PartlyCloudy, false) => "night-alt-cloudy",
            (Self::Cloudy, _) => "cloudy",
            (Self::Fog, true) => "day-fog",
            (Self::Fog, false) => "night-fog",
            (Self::Drizzle, true) => "day-sprinkle",
            (Self::Drizzle, false) => "night-alt-sprinkle",
            (Self::Rain, true) => "day-rain",
            (Self::Rain, false) => "night-alt-rain",
            (Self::HeavyRain, _) => "rain",
            (Self::Snow, true) => "day-snow",
            (Self::Snow, false) => "night-alt-snow",
            (Self::Sleet, true) => "day-sleet",
            (Self::Sleet, false) => "night-alt-sleet",
            (Self::Thunderstorm, true) => "day-thunderstorm",
            (Self::Thunderstorm, false) => "night-alt-thunderstorm",
        }
    }
}

/// Geographic location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub city_name: Option<String>,
}

/// One observation or forecast point.
///
/// Temperatures are Celsius, wind speed is m/s, precipitation is expressed in
/// `precipitation_unit`. Entries are immutable once a provider emits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherEntry {
    pub date: DateTime<FixedOffset>,
    pub temperature: f64,
    pub feels_like: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub precipitation_amount: Option<f64>,
    #[serde(default)]
    pub precipitation_unit: PrecipitationUnit,
    pub precipitation_probability: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    #[serde(default)]
    pub condition: WeatherCondition,
    #[serde(default = "default_is_day")]
    pub is_day: bool,
}

fn default_is_day() -> bool {
    true
}

impl WeatherEntry {
    /// Entry carrying only a timestamp and a temperature.
    pub fn new(date: DateTime<FixedOffset>, temperature: f64) -> Self {
        Self {
            date,
            temperature,
            feels_like: None,
            min_temperature: None,
            max_temperature: None,
            precipitation_amount: None,
            precipitation_unit: PrecipitationUnit::Mm,
            precipitation_probability: None,
            humidity: None,
            wind_speed: None,
            wind_direction: None,
            condition: WeatherCondition::Clear,
            is_day: true,
        }
    }

    pub fn weather_type(&self) -> &'static str {
        self.condition.weather_type(self.is_day)
    }
}

/// Partial current-weather values pushed in from another module.
///
/// Fields left empty keep the provider's own value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherOverride {
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub condition: Option<WeatherCondition>,
}

impl WeatherOverride {
    pub fn apply(&self, entry: &mut WeatherEntry) {
        if let Some(t) = self.temperature {
            entry.temperature = t;
        }
        if self.feels_like.is_some() {
            entry.feels_like = self.feels_like;
        }
        if self.humidity.is_some() {
            entry.humidity = self.humidity;
        }
        if self.wind_speed.is_some() {
            entry.wind_speed = self.wind_speed;
        }
        if self.wind_direction.is_some() {
            entry.wind_direction = self.wind_direction;
        }
        if let Some(condition) = self.condition {
            entry.condition = condition;
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unknown weather provider: {0}")]
    UnknownProvider(String),
}
