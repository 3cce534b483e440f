//! Rendering seam. The widget never draws; it hands data to a surface.

use std::time::Duration;

use skyboard_core::ChartKind;
use thiserror::Error;

use crate::aggregator::{ChartSeries, Extrema};
use crate::template::TemplateData;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Render surface unavailable: {0}")]
    Unavailable(String),

    #[error("Render failed: {0}")]
    Render(String),
}

/// Display the widget renders into.
pub trait RenderSurface: Send {
    /// Make the chart overlay visible
    fn show(&mut self) -> Result<(), SurfaceError>;

    /// Hide the chart overlay
    fn hide(&mut self) -> Result<(), SurfaceError>;

    /// Replace the plotted data
    fn redraw(
        &mut self,
        series: &ChartSeries,
        extrema: &Extrema,
        kind: ChartKind,
    ) -> Result<(), SurfaceError>;

    /// Re-render the widget body, animating over `speed`
    fn update_dom(&mut self, data: &TemplateData, speed: Duration) -> Result<(), SurfaceError>;
}

/// Surface that only logs what it is asked to render.
#[derive(Debug, Default)]
pub struct TracingSurface {
    visible: bool,
}

impl TracingSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderSurface for TracingSurface {
    fn show(&mut self) -> Result<(), SurfaceError> {
        self.visible = true;
        tracing::info!("Chart overlay shown");
        Ok(())
    }

    fn hide(&mut self) -> Result<(), SurfaceError> {
        self.visible = false;
        tracing::info!("Chart overlay hidden");
        Ok(())
    }

    fn redraw(
        &mut self,
        series: &ChartSeries,
        extrema: &Extrema,
        kind: ChartKind,
    ) -> Result<(), SurfaceError> {
        let points: Vec<String> = series
            .labels
            .iter()
            .zip(&series.values)
            .map(|(label, value)| format!("{}={:.1}", label, value))
            .collect();
        tracing::info!(
            "Chart ({:?}, visible: {}): [{}] axis {:?}",
            kind,
            self.visible,
            points.join(", "),
            extrema.axis_range()
        );
        Ok(())
    }

    fn update_dom(&mut self, data: &TemplateData, speed: Duration) -> Result<(), SurfaceError> {
        tracing::info!("{} ({:?} view, {:?})", data.header, data.template, speed);
        if let Some(current) = &data.current {
            tracing::info!(
                "  now {} feels {} wind {} {}",
                current.temperature,
                current.feels_like.as_deref().unwrap_or("-"),
                current.wind_speed,
                current.wind_direction.unwrap_or("")
            );
        }
        for row in &data.hourly {
            tracing::debug!(
                "  {} {} {} {} ({:.2})",
                row.time,
                row.temperature,
                row.precipitation.as_deref().unwrap_or(""),
                row.precipitation_probability.as_deref().unwrap_or(""),
                row.opacity
            );
        }
        for row in &data.forecast {
            tracing::debug!(
                "  {} {} / {} ({:.2})",
                row.date,
                row.max_temperature,
                row.min_temperature,
                row.opacity
            );
        }
        Ok(())
    }
}
