use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use skyboard_weather::{ProviderSettings, Units, WindUnits};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// What the widget shows, and therefore what it fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayType {
    Current,
    Hourly,
    /// `daily` and `forecast` are synonyms
    Forecast,
}

impl DisplayType {
    /// Parse the configured `type` string, case-insensitively.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_lowercase().as_str() {
            "current" => Ok(Self::Current),
            "hourly" => Ok(Self::Hourly),
            "daily" | "forecast" => Ok(Self::Forecast),
            _ => Err(ConfigError::UnknownDisplayType(value.to_string())),
        }
    }
}

/// Chart drawn by the render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
}

/// Clock style for hourly labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "24")]
    TwentyFourHour,
    #[serde(rename = "12")]
    TwelveHour,
}

/// Where the current humidity is shown in the current-weather view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HumidityPlacement {
    #[default]
    None,
    Wind,
    Temp,
    Feelslike,
    Below,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Provider implementation, looked up by name
    pub weather_provider: String,

    /// `current`, `hourly`, `daily` or `forecast`; checked at fetch time
    #[serde(rename = "type")]
    pub display_type: String,

    pub units: Units,

    /// Defaults to `units` when unset
    pub temp_units: Option<Units>,

    /// Defaults to `units` when unset
    pub wind_units: Option<WindUnits>,

    /// Round temperatures to whole degrees instead of one decimal
    pub round_temp: bool,

    pub update_interval_ms: u64,

    /// Delay before the first fetch; negative falls back to the update interval
    pub initial_load_delay_ms: i64,

    /// Keep every Nth hourly record
    pub hourly_forecast_increments: u32,

    pub fade: bool,

    /// Fraction of a list after which rows start fading out
    pub fade_point: f64,

    pub max_number_of_days: usize,
    pub max_entries: usize,
    pub decimal_symbol: String,
    pub degree_label: bool,
    pub allow_override_notification: bool,

    #[serde(skip_deserializing)]
    pub show_humidity: HumidityPlacement,

    pub show_feels_like: bool,
    pub show_wind_direction: bool,
    pub show_precipitation_amount: bool,
    pub show_precipitation_probability: bool,

    /// Leave today out of the forecast list
    pub ignore_today: bool,

    pub header: Option<String>,
    pub append_location_name_to_header: bool,

    /// Calendar notifications are only accepted from senders with this class
    pub calendar_class: String,

    pub time_format: TimeFormat,
    pub show_period: bool,
    pub show_period_upper: bool,

    /// strftime pattern for daily chart labels
    pub date_format: String,

    pub chart_type: ChartKind,

    /// Location and endpoints handed to the provider
    pub provider: ProviderSettings,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            weather_provider: "openmeteo".to_string(),
            display_type: "current".to_string(),
            units: Units::Metric,
            temp_units: None,
            wind_units: None,
            round_temp: false,
            update_interval_ms: 10 * 60 * 1000,
            initial_load_delay_ms: 0,
            hourly_forecast_increments: 1,
            fade: true,
            fade_point: 0.25,
            max_number_of_days: 5,
            max_entries: 5,
            decimal_symbol: ".".to_string(),
            degree_label: false,
            allow_override_notification: false,
            show_humidity: HumidityPlacement::None,
            show_feels_like: true,
            show_wind_direction: true,
            show_precipitation_amount: false,
            show_precipitation_probability: false,
            ignore_today: false,
            header: None,
            append_location_name_to_header: true,
            calendar_class: "calendar".to_string(),
            time_format: TimeFormat::TwentyFourHour,
            show_period: true,
            show_period_upper: false,
            date_format: "%m/%d".to_string(),
            chart_type: ChartKind::Line,
            provider: ProviderSettings::default(),
        }
    }
}

impl WeatherConfig {
    pub fn temperature_units(&self) -> Units {
        self.temp_units.unwrap_or(self.units)
    }

    pub fn wind_speed_units(&self) -> WindUnits {
        self.wind_units.unwrap_or_else(|| self.units.into())
    }

    /// Parsed display type. Errors on unknown values.
    pub fn display_type(&self) -> Result<DisplayType, ConfigError> {
        DisplayType::parse(&self.display_type)
    }

    /// Sampling stride for hourly records, never zero.
    pub fn hourly_increment(&self) -> usize {
        self.hourly_forecast_increments.max(1) as usize
    }
}

/// `showHumidity` as it may appear in older config files.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum ShowHumiditySetting {
    Legacy(bool),
    Placement(HumidityPlacement),
}

/// Weather section as written on disk, including deprecated options.
#[derive(Debug, Default, Deserialize)]
struct RawWeatherConfig {
    #[serde(flatten)]
    settings: WeatherConfig,
    use_kmh: Option<bool>,
    use_beaufort: Option<bool>,
    show_humidity: Option<ShowHumiditySetting>,
}

impl RawWeatherConfig {
    /// Translate deprecated options into their modern equivalents.
    ///
    /// Returns the migrated config and one warning per translated option.
    fn migrate(self) -> (WeatherConfig, Vec<String>) {
        let mut config = self.settings;
        let mut warnings = Vec::new();

        if self.use_kmh == Some(true) {
            warnings.push(
                "Deprecated option 'use_kmh' is set. Please switch to wind_units = \"kmh\""
                    .to_string(),
            );
            config.wind_units = Some(WindUnits::Kmh);
        } else if self.use_beaufort == Some(true) {
            warnings.push(
                "Deprecated option 'use_beaufort' is set. Please switch to wind_units = \"beaufort\""
                    .to_string(),
            );
            config.wind_units = Some(WindUnits::Beaufort);
        }

        config.show_humidity = match self.show_humidity {
            Some(ShowHumiditySetting::Legacy(enabled)) => {
                warnings.push(
                    "Boolean 'show_humidity' is deprecated. Please use a placement string"
                        .to_string(),
                );
                if enabled {
                    HumidityPlacement::Wind
                } else {
                    HumidityPlacement::None
                }
            }
            Some(ShowHumiditySetting::Placement(placement)) => placement,
            None => HumidityPlacement::None,
        };

        (config, warnings)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    weather: RawWeatherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Weather widget settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&contents)
    }

    /// Parse configuration text, translating deprecated options.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        let (weather, deprecations) = raw.weather.migrate();
        for warning in &deprecations {
            tracing::warn!("[weather] Deprecation warning: {}", warning);
        }

        Ok(Self { weather })
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        Self::load_validated_from(&Self::config_path()?)
    }

    /// Like [`Config::load_validated`], reading from `path`
    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        let w = &self.weather;

        if w.update_interval_ms == 0 {
            result.add_error(
                "weather.update_interval_ms",
                "Update interval must be greater than 0",
            );
        } else if w.update_interval_ms > 24 * 60 * 60 * 1000 {
            result.add_warning(
                "weather.update_interval_ms",
                "Update interval is more than 24 hours",
            );
        }

        if let Err(e) = w.display_type() {
            result.add_warning("weather.type", format!("{}; fetches will be skipped", e));
        }

        if !(0.0..=1.0).contains(&w.fade_point) {
            result.add_warning(
                "weather.fade_point",
                "Fade point outside 0..1; it will be clamped",
            );
        }

        if w.hourly_forecast_increments == 0 {
            result.add_warning(
                "weather.hourly_forecast_increments",
                "Increment of 0 is treated as 1",
            );
        }

        if w.max_entries == 0 || w.max_number_of_days == 0 {
            result.add_warning("weather.max_entries", "Lists capped at 0 rows will be empty");
        }

        if w.decimal_symbol.is_empty() {
            result.add_warning("weather.decimal_symbol", "Empty decimal symbol");
        }

        if !(-90.0..=90.0).contains(&w.provider.latitude) {
            result.add_error("weather.provider.latitude", "Latitude must be within -90..90");
        }
        if !(-180.0..=180.0).contains(&w.provider.longitude) {
            result.add_error(
                "weather.provider.longitude",
                "Longitude must be within -180..180",
            );
        }

        result
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skyboard");

        Ok(config_dir.join("config.toml"))
    }
}
