//! Skyboard weather widget
//!
//! Periodically fetches through a [`skyboard_weather::WeatherProvider`],
//! turns the results into render-ready rows and chart series, and drives a
//! toggleable chart overlay. All state lives in [`WeatherWidget`], which
//! handles one [`WidgetEvent`] at a time.

pub mod aggregator;
pub mod error;
pub mod event;
pub mod formatter;
pub mod notification;
pub mod scheduler;
pub mod surface;
pub mod template;
pub mod view;
pub mod widget;

pub use aggregator::{ChartSeries, DataAggregator, Extrema, LabelFormat, CHART_POINTS};
pub use error::WidgetError;
pub use event::WidgetEvent;
pub use formatter::UnitFormatter;
pub use notification::{
    CalendarEvent, InboundNotification, OutboundNotification, WeatherUpdatedPayload,
};
pub use scheduler::UpdateScheduler;
pub use surface::{RenderSurface, SurfaceError, TracingSurface};
pub use template::{DisplayOptions, Template, TemplateData};
pub use view::{Granularity, Navigation, ViewState, ViewStateMachine, ViewTransition};
pub use widget::{WeatherWidget, WidgetHandle};
