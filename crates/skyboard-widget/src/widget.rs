//! The weather widget: owns all state and processes events one at a time.

use std::time::Duration;

use serde_json::Value;
use skyboard_core::{DisplayType, WeatherConfig};
use skyboard_weather::{UpdateNotifier, WeatherProvider};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::aggregator::{ChartSeries, DataAggregator, Extrema, LabelFormat};
use crate::error::WidgetError;
use crate::event::WidgetEvent;
use crate::formatter::{sample_hourly, UnitFormatter};
use crate::notification::{
    CalendarEvent, InboundNotification, OutboundNotification, WeatherUpdatedPayload,
};
use crate::scheduler::UpdateScheduler;
use crate::surface::RenderSurface;
use crate::template::{
    self, DisplayOptions, IndoorReadings, Template, TemplateData, TemplateSources,
};
use crate::view::{Navigation, ViewState, ViewStateMachine, ViewTransition};

/// Animation speed for DOM updates triggered by indoor readings
const INDOOR_UPDATE_SPEED: Duration = Duration::from_millis(300);

/// Cloneable sender for feeding events into a running widget.
#[derive(Debug, Clone)]
pub struct WidgetHandle {
    events: UnboundedSender<WidgetEvent>,
}

impl WidgetHandle {
    pub fn send(&self, event: WidgetEvent) -> Result<(), WidgetError> {
        self.events.send(event).map_err(|_| WidgetError::Closed)
    }

    /// Decode and deliver a named notification from another module.
    ///
    /// Returns `false` when the notification is not one the widget handles.
    pub fn notify(
        &self,
        name: &str,
        payload: Value,
        sender_classes: Option<&str>,
    ) -> Result<bool, WidgetError> {
        match InboundNotification::parse(name, payload, sender_classes)? {
            Some(notification) => {
                self.send(WidgetEvent::Notification(notification))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn toggle_full(&self) -> Result<(), WidgetError> {
        self.send(WidgetEvent::Notification(InboundNotification::ToggleFull))
    }

    pub fn next_page(&self) -> Result<(), WidgetError> {
        self.send(WidgetEvent::Notification(InboundNotification::NextPage))
    }

    pub fn previous_page(&self) -> Result<(), WidgetError> {
        self.send(WidgetEvent::Notification(InboundNotification::PreviousPage))
    }

    pub fn shutdown(&self) -> Result<(), WidgetError> {
        self.send(WidgetEvent::Shutdown)
    }
}

pub struct WeatherWidget {
    config: WeatherConfig,
    provider: Box<dyn WeatherProvider>,
    surface: Option<Box<dyn RenderSurface>>,
    formatter: UnitFormatter,
    labels: LabelFormat,
    aggregator: DataAggregator,
    view: ViewStateMachine,
    scheduler: UpdateScheduler,
    outbound: UnboundedSender<OutboundNotification>,
    events_tx: UnboundedSender<WidgetEvent>,
    events_rx: UnboundedReceiver<WidgetEvent>,
    indoor: IndoorReadings,
    first_event: Option<CalendarEvent>,
    started: bool,
}

impl WeatherWidget {
    /// Build a widget around `provider`. Outbound notifications are sent on
    /// `outbound`; the returned handle feeds events in.
    ///
    /// Timers are spawned on the current tokio runtime once started.
    pub fn new(
        config: WeatherConfig,
        provider: Box<dyn WeatherProvider>,
        outbound: UnboundedSender<OutboundNotification>,
    ) -> (Self, WidgetHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let handle = WidgetHandle {
            events: events_tx.clone(),
        };

        let widget = Self {
            formatter: UnitFormatter::new(&config),
            labels: LabelFormat::new(&config),
            aggregator: DataAggregator::new(&config),
            view: ViewStateMachine::new(),
            scheduler: UpdateScheduler::new(
                Duration::from_millis(config.update_interval_ms),
                events_tx.clone(),
            ),
            config,
            provider,
            surface: None,
            outbound,
            events_tx,
            events_rx,
            indoor: IndoorReadings::default(),
            first_event: None,
            started: false,
        };
        (widget, handle)
    }

    pub fn with_surface(mut self, surface: Box<dyn RenderSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Start the provider and schedule the first fetch after the initial delay.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        tracing::info!(
            "Starting weather widget with provider {} ({} view)",
            self.provider.provider_name(),
            self.config.display_type
        );

        let events = self.events_tx.clone();
        self.provider.start(UpdateNotifier::new(move || {
            let _ = events.send(WidgetEvent::DataAvailable);
        }));

        self.schedule_update(Some(self.config.initial_load_delay_ms));
    }

    /// Process events until `cancel` fires or a shutdown event arrives.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), WidgetError> {
        self.start();

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Weather widget cancelled");
                    break;
                }
                event = self.events_rx.recv() => event,
            };

            let Some(event) = event else {
                return Err(WidgetError::Closed);
            };
            if !self.handle_event(event) {
                break;
            }
        }

        self.scheduler.cancel();
        Ok(())
    }

    /// Next queued event, waiting for one to arrive.
    pub async fn next_event(&mut self) -> Option<WidgetEvent> {
        self.events_rx.recv().await
    }

    /// Handle one event to completion. Returns `false` once shut down.
    pub fn handle_event(&mut self, event: WidgetEvent) -> bool {
        match event {
            WidgetEvent::FetchDue { generation } => {
                if self.scheduler.is_current(generation) {
                    self.perform_fetch();
                } else {
                    tracing::debug!("Dropping stale fetch timer (generation {})", generation);
                }
            }
            WidgetEvent::RefreshTick { generation } => {
                if self.scheduler.is_current(generation) {
                    self.refresh_chart();
                } else {
                    tracing::debug!("Dropping stale refresh tick (generation {})", generation);
                }
            }
            WidgetEvent::DataAvailable => self.update_available(),
            WidgetEvent::Notification(notification) => self.notification_received(notification),
            WidgetEvent::Shutdown => {
                tracing::info!("Weather widget shutting down");
                self.scheduler.cancel();
                return false;
            }
        }
        true
    }

    /// Re-aggregate, then replace the update timers.
    ///
    /// A non-negative `delay_ms` sets the time to the next fetch; otherwise
    /// the update interval is used.
    pub fn schedule_update(&mut self, delay_ms: Option<i64>) {
        let next_load = self.scheduler.next_load(delay_ms);
        self.update_chart_data();
        self.scheduler.arm(next_load);
    }

    fn perform_fetch(&mut self) {
        match self.config.display_type() {
            Ok(DisplayType::Current) => self.provider.fetch_current_weather(),
            Ok(DisplayType::Hourly) => self.provider.fetch_weather_hourly(),
            Ok(DisplayType::Forecast) => {
                self.provider.fetch_weather_forecast();
                self.provider.fetch_weather_hourly();
            }
            Err(e) => tracing::error!("{}", e),
        }
    }

    fn refresh_chart(&mut self) {
        self.update_chart_data();
        if self.view.state().visible {
            self.draw_chart();
        }
    }

    fn update_chart_data(&mut self) {
        let hourly = self.provider.weather_hourly();
        let daily = self.provider.weather_forecast();
        self.aggregator.aggregate(self.view.state(), &hourly, &daily);
    }

    fn draw_chart(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            tracing::debug!("No render surface attached, skipping redraw");
            return;
        };
        let extrema = self.aggregator.extrema();
        if let Err(e) = surface.redraw(self.aggregator.series(), &extrema, self.config.chart_type)
        {
            tracing::warn!("Chart redraw failed: {}", e);
        }
    }

    fn update_available(&mut self) {
        tracing::info!("New weather information available");
        self.update_dom(Duration::ZERO);
        self.schedule_update(None);

        let current = self.provider.current_weather();
        if let Some(current) = &current {
            self.emit(OutboundNotification::current_weather_type(
                current.weather_type(),
            ));
        }

        self.update_chart_data();
        self.draw_chart();

        let payload = WeatherUpdatedPayload::new(
            self.config.units,
            current,
            self.provider.weather_forecast(),
            self.provider.weather_hourly(),
            self.provider.fetched_location(),
            self.provider.provider_name(),
        );
        self.emit(OutboundNotification::WeatherUpdated(payload));
    }

    fn notification_received(&mut self, notification: InboundNotification) {
        match notification {
            InboundNotification::CalendarEvents {
                sender_classes,
                events,
            } => {
                let from_calendar = sender_classes
                    .split_whitespace()
                    .any(|class| class.eq_ignore_ascii_case(&self.config.calendar_class));
                if !from_calendar {
                    tracing::debug!("Ignoring calendar events from '{}'", sender_classes);
                    return;
                }
                self.first_event = events.into_iter().find(CalendarEvent::has_location);
                tracing::debug!("First upcoming event with location: {:?}", self.first_event);
            }
            InboundNotification::IndoorTemperature(value) => {
                self.indoor.temperature = Some(self.formatter.round_value(value));
                self.update_dom(INDOOR_UPDATE_SPEED);
            }
            InboundNotification::IndoorHumidity(value) => {
                self.indoor.humidity = Some(self.formatter.round_value(value));
                self.update_dom(INDOOR_UPDATE_SPEED);
            }
            InboundNotification::CurrentWeatherOverride(payload) => {
                if self.config.allow_override_notification {
                    self.provider.apply_override(payload);
                } else {
                    tracing::debug!("Current weather override not allowed, ignoring");
                }
            }
            InboundNotification::ToggleFull => self.navigate(Navigation::ToggleFull),
            InboundNotification::NextPage => self.navigate(Navigation::NextPage),
            InboundNotification::PreviousPage => self.navigate(Navigation::PreviousPage),
        }
    }

    fn navigate(&mut self, input: Navigation) {
        match self.view.handle(input) {
            ViewTransition::Shown => self.with_surface_op("show", |s| s.show()),
            ViewTransition::Hidden => self.with_surface_op("hide", |s| s.hide()),
            ViewTransition::GranularityChanged(_) => {
                self.update_chart_data();
                self.draw_chart();
            }
        }
    }

    fn with_surface_op(
        &mut self,
        op: &str,
        f: impl FnOnce(&mut dyn RenderSurface) -> Result<(), crate::surface::SurfaceError>,
    ) {
        match self.surface.as_deref_mut() {
            Some(surface) => {
                if let Err(e) = f(surface) {
                    tracing::warn!("Surface {} failed: {}", op, e);
                }
            }
            None => tracing::debug!("No render surface attached, skipping {}", op),
        }
    }

    fn update_dom(&mut self, speed: Duration) {
        if self.surface.is_none() {
            tracing::debug!("No render surface attached, skipping DOM update");
            return;
        }
        let data = self.template_data();
        self.with_surface_op("DOM update", |s| s.update_dom(&data, speed));
    }

    /// Widget header, with the fetched location appended when configured.
    pub fn header(&self) -> String {
        template::header(
            self.config.header.as_deref(),
            self.config.append_location_name_to_header,
            self.provider.fetched_location().as_deref(),
        )
    }

    /// Everything the surface needs to render the widget body.
    pub fn template_data(&self) -> TemplateData {
        let current = self.provider.current_weather();
        let forecast = self.provider.weather_forecast();
        let hourly = sample_hourly(
            &self.provider.weather_hourly(),
            self.config.hourly_increment(),
        );

        TemplateData::assemble(
            Template::for_type(&self.config.display_type),
            self.header(),
            DisplayOptions::new(&self.config),
            &self.formatter,
            &self.labels,
            TemplateSources {
                current: current.as_ref(),
                forecast: &forecast,
                hourly: &hourly,
                chart: self.aggregator.series(),
                indoor: &self.indoor,
                first_event: self.first_event.as_ref(),
            },
        )
    }

    fn emit(&self, notification: OutboundNotification) {
        let name = notification.name();
        if self.outbound.send(notification).is_err() {
            tracing::debug!("No listener for {}", name);
        }
    }

    pub fn view_state(&self) -> ViewState {
        self.view.state()
    }

    pub fn series(&self) -> &ChartSeries {
        self.aggregator.series()
    }

    pub fn extrema(&self) -> Extrema {
        self.aggregator.extrema()
    }

    pub fn indoor(&self) -> &IndoorReadings {
        &self.indoor
    }

    pub fn first_event(&self) -> Option<&CalendarEvent> {
        self.first_event.as_ref()
    }

    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }
}
