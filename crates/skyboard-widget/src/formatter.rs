//! Display formatting: unit conversion, rounding, list capping and the fade
//! ramp applied to long lists.

use skyboard_core::WeatherConfig;
use skyboard_weather::convert::{convert_precipitation, convert_temp, convert_wind};
use skyboard_weather::{PrecipitationUnit, Units, WeatherEntry, WindUnits};

/// Fade ramp settings for list and chart rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSettings {
    pub enabled: bool,
    /// Fraction of the list after which fading starts
    pub point: f64,
}

/// Opacity of row `index` in a list of `total` rows.
///
/// Rows before `total * point` are fully opaque; from there opacity falls
/// linearly to exactly 0 at the last row. A ramp with no room to fall keeps
/// every row at 1.
pub fn opacity(index: usize, total: usize, fade: FadeSettings) -> f64 {
    if !fade.enabled || fade.point >= 1.0 {
        return 1.0;
    }

    let point = fade.point.max(0.0);
    let start = total as f64 * point;
    let position = index as f64;
    if position < start {
        return 1.0;
    }

    let span = total as f64 - 1.0 - start;
    if span <= 0.0 {
        return 1.0;
    }
    (1.0 - (position - start) / span).clamp(0.0, 1.0)
}

/// First `min(len, max)` elements, in order.
pub fn cap<T>(seq: &[T], max: usize) -> &[T] {
    &seq[..seq.len().min(max)]
}

/// Down-sample hourly records, keeping index `i` where `(i + 1) % n == n - 1`.
///
/// An increment of 1 keeps every record; 0 is treated as 1.
pub fn sample_hourly(entries: &[WeatherEntry], increment: usize) -> Vec<WeatherEntry> {
    let n = increment.max(1);
    entries
        .iter()
        .enumerate()
        .filter(|(i, _)| (i + 1) % n == n - 1)
        .map(|(_, entry)| entry.clone())
        .collect()
}

/// Strip the sign from renderings of negative zero ("-0", "-0.0").
fn normalize_negative_zero(text: String) -> String {
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

/// Converts raw provider values into display strings for one widget.
#[derive(Debug, Clone)]
pub struct UnitFormatter {
    units: Units,
    temp_units: Units,
    wind_units: WindUnits,
    round_temp: bool,
    decimal_symbol: String,
    degree_label: bool,
    fade: FadeSettings,
    max_entries: usize,
    max_number_of_days: usize,
}

impl UnitFormatter {
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            units: config.units,
            temp_units: config.temperature_units(),
            wind_units: config.wind_speed_units(),
            round_temp: config.round_temp,
            decimal_symbol: config.decimal_symbol.clone(),
            degree_label: config.degree_label,
            fade: FadeSettings {
                enabled: config.fade,
                point: config.fade_point,
            },
            max_entries: config.max_entries,
            max_number_of_days: config.max_number_of_days,
        }
    }

    /// Round to 0 decimals with `round_temp`, otherwise 1. Never yields "-0".
    pub fn round_value(&self, value: f64) -> String {
        let decimals = if self.round_temp { 0 } else { 1 };
        normalize_negative_zero(format!("{:.*}", decimals, value))
    }

    /// Replace the decimal point with the configured symbol.
    pub fn localize(&self, text: &str) -> String {
        text.replace('.', &self.decimal_symbol)
    }

    pub fn format_temperature(&self, celsius: f64) -> String {
        let rounded = self.round_value(convert_temp(celsius, self.temp_units));
        let label = if self.degree_label {
            self.temp_units.degree_letter()
        } else {
            ""
        };
        format!("{}°{}", self.localize(&rounded), label)
    }

    pub fn format_wind(&self, ms: f64) -> String {
        let converted = convert_wind(ms, self.wind_units);
        normalize_negative_zero(format!("{:.0}", converted))
    }

    /// Empty for absent or non-numeric amounts.
    pub fn format_precip(&self, amount: Option<f64>, source: PrecipitationUnit) -> String {
        let Some(amount) = amount.filter(|a| !a.is_nan()) else {
            return String::new();
        };
        let (value, unit) = convert_precipitation(amount, source, self.units);
        let decimals = if unit == PrecipitationUnit::In { 2 } else { 1 };
        let text = normalize_negative_zero(format!("{:.*}", decimals, value));
        format!("{} {}", self.localize(&text), unit.suffix())
    }

    pub fn format_humidity(&self, value: f64) -> String {
        format!("{}%", value)
    }

    /// Whole percent, as providers report chance of precipitation.
    pub fn format_probability(&self, percent: f64) -> String {
        normalize_negative_zero(format!("{:.0}%", percent))
    }

    pub fn opacity(&self, index: usize, total: usize) -> f64 {
        opacity(index, total, self.fade)
    }

    /// Hourly rows shown in list views, capped by `max_entries`.
    pub fn cap_entries<'a, T>(&self, seq: &'a [T]) -> &'a [T] {
        cap(seq, self.max_entries)
    }

    /// Forecast rows shown in list views, capped by `max_number_of_days`.
    pub fn cap_days<'a, T>(&self, seq: &'a [T]) -> &'a [T] {
        cap(seq, self.max_number_of_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn formatter(f: impl FnOnce(&mut WeatherConfig)) -> UnitFormatter {
        let mut config = WeatherConfig::default();
        f(&mut config);
        UnitFormatter::new(&config)
    }

    fn fade(point: f64) -> FadeSettings {
        FadeSettings {
            enabled: true,
            point,
        }
    }

    #[test]
    fn test_round_value_never_negative_zero() {
        let whole = formatter(|c| c.round_temp = true);
        assert_eq!(whole.round_value(-0.04), "0");
        assert_eq!(whole.round_value(-0.6), "-1");

        let tenths = formatter(|c| c.round_temp = false);
        assert_eq!(tenths.round_value(-0.04), "0.0");
        assert_eq!(tenths.round_value(21.46), "21.5");
    }

    #[test]
    fn test_format_temperature_with_label_and_symbol() {
        let f = formatter(|c| {
            c.degree_label = true;
            c.decimal_symbol = ",".into();
        });
        assert_eq!(f.format_temperature(21.5), "21,5°C");

        let f = formatter(|c| {
            c.units = Units::Imperial;
            c.degree_label = true;
            c.round_temp = true;
        });
        assert_eq!(f.format_temperature(100.0), "212°F");

        let f = formatter(|c| {
            c.temp_units = Some(Units::Standard);
            c.degree_label = true;
            c.round_temp = true;
        });
        assert_eq!(f.format_temperature(0.0), "273°K");
    }

    #[test]
    fn test_format_temperature_without_label() {
        let f = formatter(|_| {});
        assert_eq!(f.format_temperature(-3.25), "-3.2°");
    }

    #[test]
    fn test_format_wind() {
        let f = formatter(|c| c.wind_units = Some(WindUnits::Kmh));
        assert_eq!(f.format_wind(10.0), "36");

        let f = formatter(|c| c.wind_units = Some(WindUnits::Beaufort));
        assert_eq!(f.format_wind(5.0), "3");
    }

    #[test]
    fn test_format_precip_absent_or_nan_is_empty() {
        let f = formatter(|_| {});
        assert_eq!(f.format_precip(None, PrecipitationUnit::Mm), "");
        assert_eq!(f.format_precip(Some(f64::NAN), PrecipitationUnit::Mm), "");
        assert_eq!(f.format_precip(Some(1.25), PrecipitationUnit::Cm), "12.5 mm");
    }

    #[test]
    fn test_format_precip_imperial() {
        let f = formatter(|c| c.units = Units::Imperial);
        assert_eq!(f.format_precip(Some(25.4), PrecipitationUnit::Mm), "1.00 in");
    }

    #[test]
    fn test_format_humidity() {
        let f = formatter(|_| {});
        assert_eq!(f.format_humidity(45.0), "45%");
        assert_eq!(f.format_humidity(45.5), "45.5%");
    }

    #[test]
    fn test_format_probability() {
        let f = formatter(|_| {});
        assert_eq!(f.format_probability(40.0), "40%");
        assert_eq!(f.format_probability(12.6), "13%");
    }

    #[test]
    fn test_opacity_ramp_reaches_zero_at_last_index() {
        let settings = fade(0.25);
        assert_eq!(opacity(0, 4, settings), 1.0);
        assert_eq!(opacity(3, 4, settings), 0.0);

        let ramp: Vec<f64> = (1..4).map(|i| opacity(i, 4, settings)).collect();
        assert!(ramp.windows(2).all(|w| w[0] > w[1]), "{:?}", ramp);
    }

    #[test]
    fn test_opacity_fractional_start() {
        let settings = fade(0.25);
        // start = 1.25, span = 2.75
        assert_eq!(opacity(1, 5, settings), 1.0);
        assert!((opacity(2, 5, settings) - (1.0 - 0.75 / 2.75)).abs() < 1e-12);
        assert_eq!(opacity(4, 5, settings), 0.0);
    }

    #[test]
    fn test_opacity_disabled_or_point_at_end() {
        let off = FadeSettings {
            enabled: false,
            point: 0.25,
        };
        assert_eq!(opacity(3, 4, off), 1.0);
        assert_eq!(opacity(3, 4, fade(1.0)), 1.0);
        assert_eq!(opacity(3, 4, fade(1.5)), 1.0);
    }

    #[test]
    fn test_opacity_degenerate_ramp_has_no_division_by_zero() {
        // start lands on the last index: nothing left to ramp over
        assert_eq!(opacity(3, 4, fade(0.75)), 1.0);
        assert_eq!(opacity(0, 1, fade(0.0)), 1.0);
        assert_eq!(opacity(0, 0, fade(0.5)), 1.0);
    }

    #[test]
    fn test_opacity_negative_point_is_clamped() {
        let settings = fade(-2.0);
        assert_eq!(opacity(0, 3, settings), 1.0);
        assert_eq!(opacity(1, 3, settings), 0.5);
        assert_eq!(opacity(2, 3, settings), 0.0);
    }

    #[test]
    fn test_cap_preserves_order() {
        let f = formatter(|c| {
            c.max_entries = 3;
            c.max_number_of_days = 10;
        });
        let seq = [1, 2, 3, 4, 5];
        assert_eq!(f.cap_entries(&seq), &[1, 2, 3]);
        assert_eq!(f.cap_days(&seq), &seq);
        assert!(cap::<u8>(&[], 5).is_empty());
    }

    #[test]
    fn test_sample_hourly() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let entries: Vec<WeatherEntry> = (0..7)
            .map(|i| WeatherEntry::new(tz.timestamp_opt(i * 3600, 0).unwrap(), i as f64))
            .collect();
        let temps = |v: Vec<WeatherEntry>| v.iter().map(|e| e.temperature).collect::<Vec<_>>();

        assert_eq!(temps(sample_hourly(&entries, 1)).len(), 7);
        assert_eq!(temps(sample_hourly(&entries, 0)).len(), 7);
        assert_eq!(temps(sample_hourly(&entries, 2)), vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(temps(sample_hourly(&entries, 3)), vec![1.0, 4.0]);
    }
}
