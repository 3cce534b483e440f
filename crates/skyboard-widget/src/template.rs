//! Render-ready data handed to the surface on every DOM update.

use serde::Serialize;
use skyboard_core::{HumidityPlacement, WeatherConfig};
use skyboard_weather::convert::cardinal_direction;
use skyboard_weather::WeatherEntry;

use crate::aggregator::{ChartSeries, LabelFormat};
use crate::formatter::UnitFormatter;
use crate::notification::CalendarEvent;

/// Layout chosen from the configured display type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Current,
    Hourly,
    Forecast,
}

impl Template {
    /// Unknown types render the forecast layout, which shows a loading state.
    pub fn for_type(display_type: &str) -> Self {
        match display_type.to_lowercase().as_str() {
            "current" => Self::Current,
            "hourly" => Self::Hourly,
            _ => Self::Forecast,
        }
    }
}

/// Widget header, optionally followed by the fetched location name.
pub fn header(configured: Option<&str>, append_location: bool, location: Option<&str>) -> String {
    let configured = configured.unwrap_or_default();
    match location {
        Some(location) if append_location => {
            if configured.is_empty() {
                location.to_string()
            } else {
                format!("{} {}", configured, location)
            }
        }
        _ => configured.to_string(),
    }
}

/// Which optional values the rows and current view carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayOptions {
    pub humidity_placement: HumidityPlacement,
    pub feels_like: bool,
    pub wind_direction: bool,
    pub precipitation_amount: bool,
    pub precipitation_probability: bool,
    pub ignore_today: bool,
}

impl DisplayOptions {
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            humidity_placement: config.show_humidity,
            feels_like: config.show_feels_like,
            wind_direction: config.show_wind_direction,
            precipitation_amount: config.show_precipitation_amount,
            precipitation_probability: config.show_precipitation_probability,
            ignore_today: config.ignore_today,
        }
    }

    fn precipitation(&self, formatter: &UnitFormatter, entry: &WeatherEntry) -> Option<String> {
        if !self.precipitation_amount {
            return None;
        }
        let text = formatter.format_precip(entry.precipitation_amount, entry.precipitation_unit);
        (!text.is_empty()).then_some(text)
    }

    fn probability(&self, formatter: &UnitFormatter, entry: &WeatherEntry) -> Option<String> {
        if !self.precipitation_probability {
            return None;
        }
        entry
            .precipitation_probability
            .filter(|p| !p.is_nan())
            .map(|p| formatter.format_probability(p))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentView {
    pub temperature: String,
    pub feels_like: Option<String>,
    pub humidity: Option<String>,
    pub humidity_placement: HumidityPlacement,
    pub wind_speed: String,
    pub wind_direction: Option<&'static str>,
    pub precipitation: Option<String>,
    pub precipitation_probability: Option<String>,
    pub condition: &'static str,
    pub weather_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRow {
    pub time: String,
    pub temperature: String,
    pub precipitation: Option<String>,
    pub precipitation_probability: Option<String>,
    pub weather_type: &'static str,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub date: String,
    pub max_temperature: String,
    pub min_temperature: String,
    pub precipitation: Option<String>,
    pub precipitation_probability: Option<String>,
    pub weather_type: &'static str,
    pub opacity: f64,
}

/// Readings pushed in by indoor sensor modules, already rounded
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndoorReadings {
    pub temperature: Option<String>,
    pub humidity: Option<String>,
}

/// Provider data and widget state a DOM update is built from.
#[derive(Debug, Clone, Copy)]
pub struct TemplateSources<'a> {
    pub current: Option<&'a WeatherEntry>,
    pub forecast: &'a [WeatherEntry],
    /// Already sampled by the hourly increment
    pub hourly: &'a [WeatherEntry],
    pub chart: &'a ChartSeries,
    pub indoor: &'a IndoorReadings,
    pub first_event: Option<&'a CalendarEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateData {
    pub template: Template,
    pub header: String,
    pub current: Option<CurrentView>,
    pub forecast: Vec<ForecastRow>,
    pub hourly: Vec<HourlyRow>,
    pub chart: ChartSeries,
    pub indoor: IndoorReadings,
    pub first_event: Option<CalendarEvent>,
}

impl TemplateData {
    pub fn assemble(
        template: Template,
        header: String,
        options: DisplayOptions,
        formatter: &UnitFormatter,
        labels: &LabelFormat,
        sources: TemplateSources<'_>,
    ) -> Self {
        let current = sources.current.map(|entry| CurrentView {
            temperature: formatter.format_temperature(entry.temperature),
            feels_like: entry
                .feels_like
                .filter(|_| options.feels_like)
                .map(|t| formatter.format_temperature(t)),
            humidity: entry.humidity.map(|h| formatter.format_humidity(h)),
            humidity_placement: options.humidity_placement,
            wind_speed: entry
                .wind_speed
                .map(|w| formatter.format_wind(w))
                .unwrap_or_default(),
            wind_direction: entry
                .wind_direction
                .filter(|_| options.wind_direction)
                .map(cardinal_direction),
            precipitation: options.precipitation(formatter, entry),
            precipitation_probability: options.probability(formatter, entry),
            condition: entry.condition.description(),
            weather_type: entry.weather_type(),
        });

        let upcoming = match sources.forecast.split_first() {
            Some((_, rest)) if options.ignore_today => rest,
            _ => sources.forecast,
        };
        let days = formatter.cap_days(upcoming);
        let forecast = days
            .iter()
            .enumerate()
            .map(|(i, entry)| ForecastRow {
                date: labels.format_date(&entry.date),
                max_temperature: formatter
                    .format_temperature(entry.max_temperature.unwrap_or(entry.temperature)),
                min_temperature: formatter
                    .format_temperature(entry.min_temperature.unwrap_or(entry.temperature)),
                precipitation: options.precipitation(formatter, entry),
                precipitation_probability: options.probability(formatter, entry),
                weather_type: entry.weather_type(),
                opacity: formatter.opacity(i, days.len()),
            })
            .collect();

        let entries = formatter.cap_entries(sources.hourly);
        let hourly = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| HourlyRow {
                time: labels.format_time(&entry.date),
                temperature: formatter.format_temperature(entry.temperature),
                precipitation: options.precipitation(formatter, entry),
                precipitation_probability: options.probability(formatter, entry),
                weather_type: entry.weather_type(),
                opacity: formatter.opacity(i, entries.len()),
            })
            .collect();

        Self {
            template,
            header,
            current,
            forecast,
            hourly,
            chart: sources.chart.clone(),
            indoor: sources.indoor.clone(),
            first_event: sources.first_event.cloned(),
        }
    }
}
