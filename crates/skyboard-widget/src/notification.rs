//! Notifications exchanged with other dashboard modules.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyboard_weather::{Units, WeatherEntry, WeatherOverride};

use crate::error::WidgetError;

pub const CALENDAR_EVENTS: &str = "CALENDAR_EVENTS";
pub const INDOOR_TEMPERATURE: &str = "INDOOR_TEMPERATURE";
pub const INDOOR_HUMIDITY: &str = "INDOOR_HUMIDITY";
pub const CURRENT_WEATHER_OVERRIDE: &str = "CURRENT_WEATHER_OVERRIDE";
pub const WEATHER_TOGGLE_FULL: &str = "WEATHER_TOGGLE_FULL";
pub const WEATHER_NEXT_PAGE: &str = "WEATHER_NEXT_PAGE";
pub const WEATHER_PREVIOUS_PAGE: &str = "WEATHER_PREVIOUS_PAGE";

pub const WEATHER_UPDATED: &str = "WEATHER_UPDATED";
pub const CURRENTWEATHER_TYPE: &str = "CURRENTWEATHER_TYPE";

/// Calendar entry as broadcast by a calendar module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub geo: Option<Value>,
}

impl CalendarEvent {
    pub fn has_location(&self) -> bool {
        self.location.as_deref().is_some_and(|l| !l.is_empty())
            || self.geo.as_ref().is_some_and(|g| !g.is_null())
    }
}

/// Notifications the widget understands
#[derive(Debug, Clone, PartialEq)]
pub enum InboundNotification {
    CalendarEvents {
        /// Space-separated classes of the sending module
        sender_classes: String,
        events: Vec<CalendarEvent>,
    },
    IndoorTemperature(f64),
    IndoorHumidity(f64),
    CurrentWeatherOverride(WeatherOverride),
    ToggleFull,
    NextPage,
    PreviousPage,
}

impl InboundNotification {
    /// Decode a named notification. Unknown names yield `Ok(None)`.
    pub fn parse(
        name: &str,
        payload: Value,
        sender_classes: Option<&str>,
    ) -> Result<Option<Self>, WidgetError> {
        let notification = match name {
            CALENDAR_EVENTS => Self::CalendarEvents {
                sender_classes: sender_classes.unwrap_or_default().to_string(),
                events: serde_json::from_value(payload)?,
            },
            INDOOR_TEMPERATURE => Self::IndoorTemperature(number(name, &payload)?),
            INDOOR_HUMIDITY => Self::IndoorHumidity(number(name, &payload)?),
            CURRENT_WEATHER_OVERRIDE => {
                Self::CurrentWeatherOverride(serde_json::from_value(payload)?)
            }
            WEATHER_TOGGLE_FULL => Self::ToggleFull,
            WEATHER_NEXT_PAGE => Self::NextPage,
            WEATHER_PREVIOUS_PAGE => Self::PreviousPage,
            _ => {
                tracing::debug!("Ignoring notification {}", name);
                return Ok(None);
            }
        };
        Ok(Some(notification))
    }
}

/// Numeric payload; numeric strings are accepted too.
fn number(name: &str, payload: &Value) -> Result<f64, WidgetError> {
    match payload {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| WidgetError::invalid(name, "number out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| WidgetError::invalid(name, format!("'{}' is not a number", s))),
        other => Err(WidgetError::invalid(
            name,
            format!("expected a number, got {}", other),
        )),
    }
}

/// Snapshot broadcast after every provider update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherUpdatedPayload {
    pub current_weather: Option<WeatherEntry>,
    pub forecast_array: Vec<WeatherEntry>,
    /// Unsampled hourly records
    pub hourly_array: Vec<WeatherEntry>,
    pub location_name: Option<String>,
    pub provider_name: String,
}

impl WeatherUpdatedPayload {
    /// Records are converted to imperial units when `units` is imperial.
    pub fn new(
        units: Units,
        current: Option<WeatherEntry>,
        forecast: Vec<WeatherEntry>,
        hourly: Vec<WeatherEntry>,
        location_name: Option<String>,
        provider_name: &str,
    ) -> Self {
        let imperial = units == Units::Imperial;
        let convert = |entry: WeatherEntry| {
            if imperial {
                entry.to_imperial()
            } else {
                entry
            }
        };

        Self {
            current_weather: current.map(convert),
            forecast_array: forecast.into_iter().map(convert).collect(),
            hourly_array: hourly.into_iter().map(convert).collect(),
            location_name,
            provider_name: provider_name.to_string(),
        }
    }
}

/// Notifications the widget broadcasts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundNotification {
    WeatherUpdated(WeatherUpdatedPayload),
    CurrentWeatherType {
        #[serde(rename = "type")]
        weather_type: String,
    },
}

impl OutboundNotification {
    /// Weather type with every `-` replaced by `_`.
    pub fn current_weather_type(weather_type: &str) -> Self {
        Self::CurrentWeatherType {
            weather_type: weather_type.replace('-', "_"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::WeatherUpdated(_) => WEATHER_UPDATED,
            Self::CurrentWeatherType { .. } => CURRENTWEATHER_TYPE,
        }
    }

    /// JSON payload as seen by receiving modules.
    pub fn payload(&self) -> Result<Value, WidgetError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;

    fn entry(temp: f64) -> WeatherEntry {
        let date = FixedOffset::east_opt(0).unwrap().timestamp_opt(0, 0).unwrap();
        WeatherEntry {
            wind_speed: Some(10.0),
            ..WeatherEntry::new(date, temp)
        }
    }

    #[test]
    fn test_parse_navigation() {
        assert_eq!(
            InboundNotification::parse(WEATHER_TOGGLE_FULL, Value::Null, None).unwrap(),
            Some(InboundNotification::ToggleFull)
        );
        assert_eq!(
            InboundNotification::parse(WEATHER_NEXT_PAGE, Value::Null, None).unwrap(),
            Some(InboundNotification::NextPage)
        );
        assert_eq!(
            InboundNotification::parse(WEATHER_PREVIOUS_PAGE, Value::Null, None).unwrap(),
            Some(InboundNotification::PreviousPage)
        );
    }

    #[test]
    fn test_parse_unknown_is_ignored() {
        assert!(InboundNotification::parse("CLOCK_SECOND", json!(12), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_parse_indoor_values() {
        assert_eq!(
            InboundNotification::parse(INDOOR_TEMPERATURE, json!(21.37), None).unwrap(),
            Some(InboundNotification::IndoorTemperature(21.37))
        );
        assert_eq!(
            InboundNotification::parse(INDOOR_HUMIDITY, json!(" 48 "), None).unwrap(),
            Some(InboundNotification::IndoorHumidity(48.0))
        );

        let err = InboundNotification::parse(INDOOR_HUMIDITY, json!({"v": 1}), None).unwrap_err();
        assert!(matches!(err, WidgetError::InvalidPayload { .. }));
        assert!(InboundNotification::parse(INDOOR_TEMPERATURE, json!("warm"), None).is_err());
    }

    #[test]
    fn test_parse_calendar_events() {
        let payload = json!([
            {"title": "Standup"},
            {"title": "Lunch", "location": "Cafe"}
        ]);
        let parsed =
            InboundNotification::parse(CALENDAR_EVENTS, payload, Some("calendar small")).unwrap();
        let expected = InboundNotification::CalendarEvents {
            sender_classes: "calendar small".to_string(),
            events: vec![
                CalendarEvent {
                    title: "Standup".to_string(),
                    location: None,
                    geo: None,
                },
                CalendarEvent {
                    title: "Lunch".to_string(),
                    location: Some("Cafe".to_string()),
                    geo: None,
                },
            ],
        };
        assert_eq!(parsed, Some(expected));
    }

    #[test]
    fn test_calendar_event_geo_counts_as_location() {
        let event: CalendarEvent =
            serde_json::from_value(json!({"title": "Hike", "geo": {"lat": 1.0, "lon": 2.0}}))
                .unwrap();
        assert!(event.has_location());

        let empty: CalendarEvent =
            serde_json::from_value(json!({"title": "Call", "location": ""})).unwrap();
        assert!(!empty.has_location());
    }

    #[test]
    fn test_parse_override() {
        let parsed = InboundNotification::parse(
            CURRENT_WEATHER_OVERRIDE,
            json!({"temperature": 3.5, "feelsLike": 1.0}),
            None,
        )
        .unwrap();
        let expected = WeatherOverride {
            temperature: Some(3.5),
            feels_like: Some(1.0),
            ..WeatherOverride::default()
        };
        assert_eq!(
            parsed,
            Some(InboundNotification::CurrentWeatherOverride(expected))
        );
    }

    #[test]
    fn test_current_weather_type_replaces_every_dash() {
        let n = OutboundNotification::current_weather_type("night-alt-rain-mix");
        assert_eq!(n.name(), CURRENTWEATHER_TYPE);
        assert_eq!(n.payload().unwrap(), json!({"type": "night_alt_rain_mix"}));
    }

    #[test]
    fn test_weather_updated_payload_imperial() {
        let payload = WeatherUpdatedPayload::new(
            Units::Imperial,
            Some(entry(100.0)),
            vec![entry(0.0)],
            vec![entry(0.0), entry(100.0)],
            Some("Berlin".into()),
            "Open-Meteo",
        );
        assert_eq!(payload.current_weather.as_ref().unwrap().temperature, 212.0);
        assert_eq!(payload.forecast_array[0].temperature, 32.0);
        assert_eq!(payload.hourly_array.len(), 2);

        let value = OutboundNotification::WeatherUpdated(payload).payload().unwrap();
        assert_eq!(value["providerName"], "Open-Meteo");
        assert_eq!(value["locationName"], "Berlin");
        assert!(value["hourlyArray"].is_array());
    }

    #[test]
    fn test_weather_updated_payload_metric_untouched() {
        let payload =
            WeatherUpdatedPayload::new(Units::Metric, None, vec![], vec![entry(5.0)], None, "x");
        assert!(payload.current_weather.is_none());
        assert_eq!(payload.hourly_array[0].temperature, 5.0);
        assert_eq!(payload.hourly_array[0].wind_speed, Some(10.0));
    }
}
