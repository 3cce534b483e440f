//! Builds the chart series for the overlay from provider records.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use skyboard_core::{TimeFormat, WeatherConfig};
use skyboard_weather::WeatherEntry;

use crate::formatter::{cap, sample_hourly};
use crate::view::{Granularity, ViewState};

/// Points plotted per series
pub const CHART_POINTS: usize = 5;

const FALLBACK_DATE_FORMAT: &str = "%m/%d";

/// Labels and values, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn clear(&mut self) {
        self.labels.clear();
        self.values.clear();
    }

    fn push(&mut self, label: String, value: f64) {
        self.labels.push(label);
        self.values.push(value);
    }
}

/// Running temperature bounds for the chart axis. Only ever widens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extrema {
    pub min: f64,
    pub max: f64,
}

impl Default for Extrema {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Extrema {
    fn widen(&mut self, low: f64, high: f64) {
        if low < self.min {
            self.min = low;
        }
        if high > self.max {
            self.max = high;
        }
    }

    /// Axis bounds once at least one value has been observed.
    pub fn axis_range(&self) -> Option<(f64, f64)> {
        (self.min.is_finite() && self.max.is_finite()).then_some((self.min, self.max))
    }
}

/// Chart label formatting for both granularities.
#[derive(Debug, Clone)]
pub struct LabelFormat {
    time_format: TimeFormat,
    show_period: bool,
    show_period_upper: bool,
    date_format: String,
}

impl LabelFormat {
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            time_format: config.time_format,
            show_period: config.show_period,
            show_period_upper: config.show_period_upper,
            date_format: config.date_format.clone(),
        }
    }

    /// Time of day in the entry's own offset.
    pub fn format_time(&self, date: &DateTime<FixedOffset>) -> String {
        let pattern = match self.time_format {
            TimeFormat::TwentyFourHour => "%H:%M",
            TimeFormat::TwelveHour if self.show_period_upper => "%-I:%M %p",
            TimeFormat::TwelveHour if self.show_period => "%-I:%M %P",
            TimeFormat::TwelveHour => "%-I:%M",
        };
        date.format(pattern).to_string()
    }

    /// Month and day; an unusable pattern falls back to `%m/%d`.
    pub fn format_date(&self, date: &DateTime<FixedOffset>) -> String {
        let mut label = String::new();
        if write!(label, "{}", date.format(&self.date_format)).is_ok() {
            return label;
        }

        tracing::warn!(
            "Invalid date format '{}', using {}",
            self.date_format,
            FALLBACK_DATE_FORMAT
        );
        date.format(FALLBACK_DATE_FORMAT).to_string()
    }
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self::new(&WeatherConfig::default())
    }
}

/// Owns the chart series and the running extrema.
#[derive(Debug)]
pub struct DataAggregator {
    labels: LabelFormat,
    hourly_increment: usize,
    series: ChartSeries,
    extrema: Extrema,
}

impl DataAggregator {
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            labels: LabelFormat::new(config),
            hourly_increment: config.hourly_increment(),
            series: ChartSeries::default(),
            extrema: Extrema::default(),
        }
    }

    /// Rebuild the series for `view` from scratch.
    ///
    /// `hourly` is the provider's unsampled list; it is sampled by the
    /// configured increment before capping. Extrema are widened in hourly
    /// mode only.
    pub fn aggregate(
        &mut self,
        view: ViewState,
        hourly: &[WeatherEntry],
        daily: &[WeatherEntry],
    ) -> &ChartSeries {
        self.series.clear();

        match view.granularity {
            Granularity::Hourly => {
                let sampled = sample_hourly(hourly, self.hourly_increment);
                for entry in cap(&sampled, CHART_POINTS) {
                    self.series
                        .push(self.labels.format_time(&entry.date), entry.temperature);
                    self.extrema.widen(
                        entry.min_temperature.unwrap_or(entry.temperature),
                        entry.max_temperature.unwrap_or(entry.temperature),
                    );
                }
            }
            Granularity::Daily => {
                for entry in cap(daily, CHART_POINTS) {
                    self.series
                        .push(self.labels.format_date(&entry.date), entry.temperature);
                }
            }
        }

        tracing::debug!(
            "Aggregated {} {:?} points, extrema {:?}",
            self.series.len(),
            view.granularity,
            self.extrema
        );
        &self.series
    }

    pub fn series(&self) -> &ChartSeries {
        &self.series
    }

    pub fn extrema(&self) -> Extrema {
        self.extrema
    }
}
