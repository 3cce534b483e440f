//! Open-Meteo provider: free forecast API, no key required.
//! See: https://open-meteo.com/en/docs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::geocode;
use crate::provider::{ProviderSettings, UpdateNotifier, WeatherProvider};
use crate::types::{
    Location, PrecipitationUnit, WeatherCondition, WeatherEntry, WeatherError, WeatherOverride,
};

const PROVIDER_NAME: &str = "Open-Meteo";
const HOURLY_FORECAST_HOURS: &str = "48";

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,\
precipitation,wind_speed_10m,wind_direction_10m,weather_code,is_day";
const HOURLY_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,\
precipitation,precipitation_probability,wind_speed_10m,wind_direction_10m,weather_code,is_day";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,\
precipitation_probability_max,wind_speed_10m_max,wind_direction_10m_dominant,weather_code";

/// Which block of the forecast endpoint a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Current,
    Hourly,
    Daily,
}

impl FetchKind {
    fn label(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
        }
    }
}

/// Results shared between the provider and its in-flight fetch tasks.
#[derive(Debug, Default)]
struct ProviderState {
    current: Option<WeatherEntry>,
    forecast: Vec<WeatherEntry>,
    hourly: Vec<WeatherEntry>,
    location_name: Option<String>,
    current_override: Option<WeatherOverride>,
}

pub struct OpenMeteoProvider {
    client: Client,
    settings: ProviderSettings,
    state: Arc<RwLock<ProviderState>>,
    notifier: Option<UpdateNotifier>,
}

impl OpenMeteoProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("skyboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let state = ProviderState {
            location_name: settings.location_name.clone(),
            ..Default::default()
        };

        Ok(Self {
            client,
            settings,
            state: Arc::new(RwLock::new(state)),
            notifier: None,
        })
    }

    fn location(&self) -> Location {
        Location {
            latitude: self.settings.latitude,
            longitude: self.settings.longitude,
            city_name: self.settings.location_name.clone(),
        }
    }

    fn request_url(&self, kind: FetchKind) -> Result<Url, WeatherError> {
        let base = format!("{}/v1/forecast", self.settings.api_base.trim_end_matches('/'));
        let mut params = vec![
            ("latitude", self.settings.latitude.to_string()),
            ("longitude", self.settings.longitude.to_string()),
            ("timezone", "auto".to_string()),
            ("timeformat", "unixtime".to_string()),
            ("wind_speed_unit", "ms".to_string()),
        ];
        match kind {
            FetchKind::Current => params.push(("current", CURRENT_FIELDS.to_string())),
            FetchKind::Hourly => {
                params.push(("hourly", HOURLY_FIELDS.to_string()));
                params.push(("forecast_hours", HOURLY_FORECAST_HOURS.to_string()));
            }
            FetchKind::Daily => {
                params.push(("daily", DAILY_FIELDS.to_string()));
                params.push(("forecast_days", self.settings.forecast_days.to_string()));
            }
        }
        Ok(Url::parse_with_params(&base, &params)?)
    }

    fn spawn_fetch(&self, kind: FetchKind) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::error!("Cannot fetch {} weather outside a tokio runtime", kind.label());
                return;
            }
        };

        let url = match self.request_url(kind) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Failed to build {} weather request: {}", kind.label(), e);
                return;
            }
        };

        let client = self.client.clone();
        let state = self.state.clone();
        let notifier = self.notifier.clone();

        runtime.spawn(async move {
            let response = match fetch_forecast(&client, url).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Open-Meteo {} fetch failed: {}", kind.label(), e);
                    return;
                }
            };

            {
                let mut state = state.write();
                match kind {
                    FetchKind::Current => state.current = parse_current(&response),
                    FetchKind::Hourly => state.hourly = parse_hourly(&response),
                    FetchKind::Daily => state.forecast = parse_daily(&response),
                }
            }

            tracing::debug!("Open-Meteo {} weather updated", kind.label());
            if let Some(notifier) = notifier {
                notifier.notify();
            }
        });
    }
}

impl WeatherProvider for OpenMeteoProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn start(&mut self, notifier: UpdateNotifier) {
        tracing::info!(
            "Starting {} provider for {}, {}",
            PROVIDER_NAME,
            self.settings.latitude,
            self.settings.longitude
        );
        self.notifier = Some(notifier);

        if self.state.read().location_name.is_some() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let client = self.client.clone();
        let base = self.settings.geocode_base.clone();
        let location = self.location();
        let state = self.state.clone();
        runtime.spawn(async move {
            if let Some(name) = geocode::reverse_geocode(&client, &base, &location).await {
                state.write().location_name = Some(name);
            }
        });
    }

    fn fetch_current_weather(&mut self) {
        self.spawn_fetch(FetchKind::Current);
    }

    fn fetch_weather_forecast(&mut self) {
        self.spawn_fetch(FetchKind::Daily);
    }

    fn fetch_weather_hourly(&mut self) {
        self.spawn_fetch(FetchKind::Hourly);
    }

    fn current_weather(&self) -> Option<WeatherEntry> {
        let state = self.state.read();
        let mut current = state.current.clone()?;
        if let Some(ov) = &state.current_override {
            ov.apply(&mut current);
        }
        Some(current)
    }

    fn weather_forecast(&self) -> Vec<WeatherEntry> {
        self.state.read().forecast.clone()
    }

    fn weather_hourly(&self) -> Vec<WeatherEntry> {
        self.state.read().hourly.clone()
    }

    fn fetched_location(&self) -> Option<String> {
        let name = self.state.read().location_name.clone();
        Some(name.unwrap_or_else(|| geocode::coordinates_label(&self.location())))
    }

    fn apply_override(&mut self, payload: WeatherOverride) {
        tracing::debug!("Applying current weather override: {:?}", payload);
        self.state.write().current_override = Some(payload);
    }
}

async fn fetch_forecast(client: &Client, url: Url) -> Result<ForecastResponse, WeatherError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.json::<ForecastResponse>().await?)
}

// API Response Types

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    current: Option<CurrentBlock>,
    hourly: Option<HourlyBlock>,
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: i64,
    temperature_2m: f64,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    weather_code: Option<i32>,
    is_day: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HourlyBlock {
    time: Vec<i64>,
    temperature_2m: Vec<Option<f64>>,
    apparent_temperature: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    wind_direction_10m: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
    is_day: Vec<Option<u8>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DailyBlock {
    time: Vec<i64>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    precipitation_probability_max: Vec<Option<f64>>,
    wind_speed_10m_max: Vec<Option<f64>>,
    wind_direction_10m_dominant: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
}

fn at<T: Copy>(column: &[Option<T>], index: usize) -> Option<T> {
    column.get(index).copied().flatten()
}

fn offset(seconds: i32) -> FixedOffset {
    FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
}

fn timestamp(secs: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(secs, 0).map(|utc| utc.with_timezone(&offset))
}

fn condition(code: Option<i32>) -> WeatherCondition {
    code.map(WeatherCondition::from_wmo_code).unwrap_or_default()
}

fn parse_current(response: &ForecastResponse) -> Option<WeatherEntry> {
    let block = response.current.as_ref()?;
    let date = timestamp(block.time, offset(response.utc_offset_seconds))?;

    Some(WeatherEntry {
        feels_like: block.apparent_temperature,
        precipitation_amount: block.precipitation,
        precipitation_unit: PrecipitationUnit::Mm,
        humidity: block.relative_humidity_2m,
        wind_speed: block.wind_speed_10m,
        wind_direction: block.wind_direction_10m,
        condition: condition(block.weather_code),
        is_day: block.is_day.map_or(true, |d| d != 0),
        ..WeatherEntry::new(date, block.temperature_2m)
    })
}

fn parse_hourly(response: &ForecastResponse) -> Vec<WeatherEntry> {
    let Some(block) = response.hourly.as_ref() else {
        return Vec::new();
    };
    let tz = offset(response.utc_offset_seconds);

    block
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, &secs)| {
            let date = timestamp(secs, tz)?;
            let temperature = at(&block.temperature_2m, i)?;
            Some(WeatherEntry {
                feels_like: at(&block.apparent_temperature, i),
                precipitation_amount: at(&block.precipitation, i),
                precipitation_probability: at(&block.precipitation_probability, i),
                humidity: at(&block.relative_humidity_2m, i),
                wind_speed: at(&block.wind_speed_10m, i),
                wind_direction: at(&block.wind_direction_10m, i),
                condition: condition(at(&block.weather_code, i)),
                is_day: at(&block.is_day, i).map_or(true, |d| d != 0),
                ..WeatherEntry::new(date, temperature)
            })
        })
        .collect()
}

fn parse_daily(response: &ForecastResponse) -> Vec<WeatherEntry> {
    let Some(block) = response.daily.as_ref() else {
        return Vec::new();
    };
    let tz = offset(response.utc_offset_seconds);

    block
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, &secs)| {
            let date = timestamp(secs, tz)?;
            let max = at(&block.temperature_2m_max, i)?;
            let min = at(&block.temperature_2m_min, i)?;
            Some(WeatherEntry {
                min_temperature: Some(min),
                max_temperature: Some(max),
                precipitation_amount: at(&block.precipitation_sum, i),
                precipitation_probability: at(&block.precipitation_probability_max, i),
                wind_speed: at(&block.wind_speed_10m_max, i),
                wind_direction: at(&block.wind_direction_10m_dominant, i),
                condition: condition(at(&block.weather_code, i)),
                // Daily records carry no point temperature; chart the midpoint
                ..WeatherEntry::new(date, (max + min) / 2.0)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hourly_body() -> serde_json::Value {
        serde_json::json!({
            "utc_offset_seconds": 25200,
            "hourly": {
                "time": [0, 3600, 7200],
                "temperature_2m": [20.0, 21.0, null],
                "precipitation": [0.0, 1.2, 0.4],
                "weather_code": [0, 61, 3],
                "is_day": [1, 1, 0]
            }
        })
    }

    fn settings(base: &str) -> ProviderSettings {
        ProviderSettings {
            location_name: Some("Sài Gòn".into()),
            api_base: base.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_hourly_skips_missing_temperatures() {
        let response: ForecastResponse = serde_json::from_value(hourly_body()).unwrap();
        let entries = parse_hourly(&response);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].temperature, 20.0);
        assert_eq!(entries[1].condition, WeatherCondition::Rain);
        assert_eq!(entries[1].precipitation_amount, Some(1.2));
        assert_eq!(entries[0].date.offset().local_minus_utc(), 25200);
    }

    #[test]
    fn test_parse_daily_midpoint_and_extremes() {
        let response: ForecastResponse = serde_json::from_value(serde_json::json!({
            "daily": {
                "time": [86400],
                "temperature_2m_max": [30.0],
                "temperature_2m_min": [22.0],
                "precipitation_sum": [4.5]
            }
        }))
        .unwrap();
        let days = parse_daily(&response);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].temperature, 26.0);
        assert_eq!(days[0].max_temperature, Some(30.0));
        assert_eq!(days[0].min_temperature, Some(22.0));
    }

    #[test]
    fn test_parse_missing_blocks_are_empty() {
        let response: ForecastResponse = serde_json::from_str("{}").unwrap();
        assert!(parse_current(&response).is_none());
        assert!(parse_hourly(&response).is_empty());
        assert!(parse_daily(&response).is_empty());
    }

    #[test]
    fn test_request_url_for_hourly() {
        let provider = OpenMeteoProvider::new(settings("http://localhost:1")).unwrap();
        let url = provider.request_url(FetchKind::Hourly).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/v1/forecast");
        assert!(query.iter().any(|(k, v)| k == "hourly" && v.contains("temperature_2m")));
        assert!(query.iter().any(|(k, v)| k == "timeformat" && v == "unixtime"));
        assert!(!query.iter().any(|(k, _)| k == "daily"));
    }

    #[test]
    fn test_override_applies_to_current() {
        let mut provider = OpenMeteoProvider::new(settings("http://localhost:1")).unwrap();
        let date = offset(0).timestamp_opt(0, 0).unwrap();
        provider.state.write().current = Some(WeatherEntry::new(date, 10.0));

        provider.apply_override(WeatherOverride {
            temperature: Some(12.5),
            ..Default::default()
        });

        assert_eq!(provider.current_weather().map(|c| c.temperature), Some(12.5));
    }

    #[test]
    fn test_fetched_location_prefers_configured_name() {
        let provider = OpenMeteoProvider::new(settings("http://localhost:1")).unwrap();
        assert_eq!(provider.fetched_location().as_deref(), Some("Sài Gòn"));
    }

    #[tokio::test]
    async fn test_fetch_hourly_notifies_and_stores() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("forecast_hours", "48"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hourly_body()))
            .mount(&server)
            .await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();

        let mut provider = OpenMeteoProvider::new(settings(&server.uri())).unwrap();
        provider.start(UpdateNotifier::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(());
        }));
        provider.fetch_weather_hourly();

        rx.recv().await.unwrap();
        assert_eq!(notified.load(Ordering::SeqCst), 1);
        assert_eq!(provider.weather_hourly().len(), 2);
        assert!(provider.weather_forecast().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_notify() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        let mut provider = OpenMeteoProvider::new(settings(&server.uri())).unwrap();
        provider.start(UpdateNotifier::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        provider.fetch_current_weather();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(notified.load(Ordering::SeqCst), 0);
        assert!(provider.current_weather().is_none());
    }
}
