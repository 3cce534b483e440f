use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeZone};
use serde_json::json;
use skyboard_core::{ChartKind, WeatherConfig};
use skyboard_weather::{UpdateNotifier, WeatherEntry, WeatherProvider};
use skyboard_widget::{
    ChartSeries, Extrema, OutboundNotification, RenderSurface, SurfaceError, TemplateData,
    WeatherWidget,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn at(hour: i64) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .timestamp_opt(hour * 3600, 0)
        .unwrap()
}

#[derive(Default)]
struct ProviderState {
    notifier: Option<UpdateNotifier>,
    fetches: usize,
    hourly: Vec<WeatherEntry>,
    forecast: Vec<WeatherEntry>,
}

/// Provider that "fetches" instantly and notifies through the widget's callback.
#[derive(Clone, Default)]
struct InstantProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl InstantProvider {
    fn fetches(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    fn complete_fetch(&mut self) {
        let notifier = {
            let mut state = self.state.lock().unwrap();
            state.fetches += 1;
            let base = state.fetches as f64;
            state.hourly = (0..3)
                .map(|h| WeatherEntry {
                    min_temperature: Some(base - 1.0),
                    max_temperature: Some(base + 10.0),
                    ..WeatherEntry::new(at(h), base + h as f64)
                })
                .collect();
            state.forecast = (0..2)
                .map(|d| WeatherEntry::new(at(d * 24), base * 2.0))
                .collect();
            state.notifier.clone()
        };
        if let Some(notifier) = notifier {
            notifier.notify();
        }
    }
}

impl WeatherProvider for InstantProvider {
    fn provider_name(&self) -> &str {
        "Instant"
    }

    fn start(&mut self, notifier: UpdateNotifier) {
        self.state.lock().unwrap().notifier = Some(notifier);
    }

    fn fetch_current_weather(&mut self) {
        self.complete_fetch();
    }

    fn fetch_weather_forecast(&mut self) {
        self.complete_fetch();
    }

    fn fetch_weather_hourly(&mut self) {
        self.complete_fetch();
    }

    fn current_weather(&self) -> Option<WeatherEntry> {
        None
    }

    fn weather_forecast(&self) -> Vec<WeatherEntry> {
        self.state.lock().unwrap().forecast.clone()
    }

    fn weather_hourly(&self) -> Vec<WeatherEntry> {
        self.state.lock().unwrap().hourly.clone()
    }

    fn fetched_location(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Drawn {
    Show,
    Hide,
    Chart(ChartSeries),
    Dom {
        speed: Duration,
        indoor_temperature: Option<String>,
    },
}

struct ChannelSurface {
    tx: UnboundedSender<Drawn>,
}

impl RenderSurface for ChannelSurface {
    fn show(&mut self) -> Result<(), SurfaceError> {
        let _ = self.tx.send(Drawn::Show);
        Ok(())
    }

    fn hide(&mut self) -> Result<(), SurfaceError> {
        let _ = self.tx.send(Drawn::Hide);
        Ok(())
    }

    fn redraw(
        &mut self,
        series: &ChartSeries,
        _extrema: &Extrema,
        _kind: ChartKind,
    ) -> Result<(), SurfaceError> {
        let _ = self.tx.send(Drawn::Chart(series.clone()));
        Ok(())
    }

    fn update_dom(&mut self, data: &TemplateData, speed: Duration) -> Result<(), SurfaceError> {
        let _ = self.tx.send(Drawn::Dom {
            speed,
            indoor_temperature: data.indoor.temperature.clone(),
        });
        Ok(())
    }
}

struct Running {
    provider: InstantProvider,
    drawn: UnboundedReceiver<Drawn>,
    outbound: UnboundedReceiver<OutboundNotification>,
    handle: skyboard_widget::WidgetHandle,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<Result<(), skyboard_widget::WidgetError>>,
}

fn spawn_widget(config: WeatherConfig) -> Running {
    let provider = InstantProvider::default();
    let (drawn_tx, drawn) = mpsc::unbounded_channel();
    let (outbound_tx, outbound) = mpsc::unbounded_channel();
    let (widget, handle) = WeatherWidget::new(config, Box::new(provider.clone()), outbound_tx);
    let widget = widget.with_surface(Box::new(ChannelSurface { tx: drawn_tx }));

    let cancel = CancellationToken::new();
    let task = tokio::spawn(widget.run(cancel.clone()));
    Running {
        provider,
        drawn,
        outbound,
        handle,
        cancel,
        task,
    }
}

fn hourly_config() -> WeatherConfig {
    WeatherConfig {
        display_type: "hourly".to_string(),
        update_interval_ms: 60_000,
        initial_load_delay_ms: 1_000,
        ..WeatherConfig::default()
    }
}

async fn next_weather_update(outbound: &mut UnboundedReceiver<OutboundNotification>) -> usize {
    loop {
        match outbound.recv().await.unwrap() {
            OutboundNotification::WeatherUpdated(payload) => return payload.hourly_array.len(),
            OutboundNotification::CurrentWeatherType { .. } => continue,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_widget_fetches_refreshes_and_navigates() {
    let started = Instant::now();
    let mut w = spawn_widget(hourly_config());

    assert_eq!(next_weather_update(&mut w.outbound).await, 3);
    assert!(started.elapsed() >= Duration::from_millis(1_000));
    assert_eq!(w.provider.fetches(), 1);

    assert_eq!(
        w.drawn.recv().await.unwrap(),
        Drawn::Dom {
            speed: Duration::ZERO,
            indoor_temperature: None
        }
    );
    let Drawn::Chart(hourly) = w.drawn.recv().await.unwrap() else {
        unreachable!("expected a chart redraw");
    };
    assert_eq!(hourly.labels, vec!["01:00", "02:00", "03:00"]);
    assert_eq!(hourly.values, vec![1.0, 2.0, 3.0]);

    w.handle.toggle_full().unwrap();
    assert_eq!(w.drawn.recv().await.unwrap(), Drawn::Show);

    w.handle.next_page().unwrap();
    let Drawn::Chart(daily) = w.drawn.recv().await.unwrap() else {
        unreachable!("expected a chart redraw");
    };
    assert_eq!(daily.labels, vec!["01/01", "01/02"]);
    assert_eq!(daily.values, vec![2.0, 2.0]);

    // next fetch comes one update interval after the data arrived
    assert_eq!(next_weather_update(&mut w.outbound).await, 3);
    assert!(started.elapsed() >= Duration::from_millis(61_000));
    assert_eq!(w.provider.fetches(), 2);

    w.cancel.cancel();
    w.task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_timers_do_not_multiply_across_updates() {
    let started = Instant::now();
    let mut w = spawn_widget(hourly_config());

    for _ in 0..4 {
        next_weather_update(&mut w.outbound).await;
    }
    // one fetch per interval: 1s initial delay, then every 60s
    assert_eq!(w.provider.fetches(), 4);
    assert!(started.elapsed() >= Duration::from_millis(181_000));
    assert!(started.elapsed() < Duration::from_millis(241_000));

    w.cancel.cancel();
    w.task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_indoor_notification_updates_dom() {
    let mut w = spawn_widget(WeatherConfig {
        initial_load_delay_ms: 3_600_000,
        ..hourly_config()
    });

    assert!(w
        .handle
        .notify("INDOOR_TEMPERATURE", json!("19.96"), None)
        .unwrap());
    assert_eq!(
        w.drawn.recv().await.unwrap(),
        Drawn::Dom {
            speed: Duration::from_millis(300),
            indoor_temperature: Some("20.0".to_string())
        }
    );
    assert_eq!(w.provider.fetches(), 0);

    w.handle.shutdown().unwrap();
    w.task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_invalid_notification_payload_is_rejected() {
    let w = spawn_widget(hourly_config());
    let err = w
        .handle
        .notify("INDOOR_HUMIDITY", json!([1, 2]), None)
        .unwrap_err();
    assert!(err.to_string().contains("INDOOR_HUMIDITY"));

    w.cancel.cancel();
    w.task.await.unwrap().unwrap();
}
