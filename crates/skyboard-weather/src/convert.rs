//! Unit conversions for raw provider values.
//!
//! Providers emit metric records (Celsius, m/s, mm); everything the user sees
//! goes through here first.

use crate::types::{PrecipitationUnit, Units, WeatherEntry, WindUnits};

const MS_TO_MPH: f64 = 2.236_936_292_054_4;
const MS_TO_KMH: f64 = 3.6;
const MS_TO_KNOTS: f64 = 1.943_844;
const MM_PER_INCH: f64 = 25.4;

/// Upper km/h bound of each Beaufort force, 0 through 11.
const BEAUFORT_KMH: [f64; 12] = [
    1.0, 5.0, 11.0, 19.0, 28.0, 38.0, 49.0, 61.0, 74.0, 88.0, 102.0, 117.0,
];

/// Convert a Celsius temperature into the requested unit system.
pub fn convert_temp(celsius: f64, units: Units) -> f64 {
    match units {
        Units::Metric => celsius,
        Units::Imperial => celsius * 9.0 / 5.0 + 32.0,
        Units::Standard => celsius + 273.15,
    }
}

/// Convert a wind speed in m/s into the requested display unit.
pub fn convert_wind(ms: f64, units: WindUnits) -> f64 {
    match units {
        WindUnits::Metric => ms,
        WindUnits::Imperial => ms * MS_TO_MPH,
        WindUnits::Kmh => ms * MS_TO_KMH,
        WindUnits::Knots => ms * MS_TO_KNOTS,
        WindUnits::Beaufort => f64::from(beaufort(ms)),
    }
}

/// Beaufort force for a wind speed in m/s.
pub fn beaufort(ms: f64) -> u8 {
    let kmh = ms * MS_TO_KMH;
    BEAUFORT_KMH
        .iter()
        .position(|&bound| kmh < bound)
        .map_or(12, |force| force as u8)
}

/// Normalize a precipitation amount to millimeters, then express it in the
/// output unit system (inches for imperial, millimeters otherwise).
pub fn convert_precipitation(
    value: f64,
    from: PrecipitationUnit,
    to: Units,
) -> (f64, PrecipitationUnit) {
    let mm = match from {
        PrecipitationUnit::Mm => value,
        PrecipitationUnit::Cm => value * 10.0,
        PrecipitationUnit::In => value * MM_PER_INCH,
    };
    match to {
        Units::Imperial => (mm / MM_PER_INCH, PrecipitationUnit::In),
        Units::Metric | Units::Standard => (mm, PrecipitationUnit::Mm),
    }
}

/// 16-point compass abbreviation for a bearing in degrees.
pub fn cardinal_direction(degrees: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let normalized = degrees.rem_euclid(360.0);
    let index = ((normalized / 22.5).round() as usize) % POINTS.len();
    POINTS[index]
}

impl WeatherEntry {
    /// Copy of this entry with every measurement expressed in imperial units.
    pub fn to_imperial(&self) -> WeatherEntry {
        let mut converted = self.clone();
        let temp = |c: f64| convert_temp(c, Units::Imperial);

        converted.temperature = temp(self.temperature);
        converted.feels_like = self.feels_like.map(temp);
        converted.min_temperature = self.min_temperature.map(temp);
        converted.max_temperature = self.max_temperature.map(temp);
        converted.wind_speed = self
            .wind_speed
            .map(|ms| convert_wind(ms, WindUnits::Imperial));
        if let Some(amount) = self.precipitation_amount {
            let (inches, unit) =
                convert_precipitation(amount, self.precipitation_unit, Units::Imperial);
            converted.precipitation_amount = Some(inches);
            converted.precipitation_unit = unit;
        }
        converted
    }
}
