use std::path::PathBuf;

use anyhow::{Context, Result};
use skyboard_core::{AppError, Config, ConfigError};
use skyboard_widget::{OutboundNotification, TracingSurface, WeatherWidget};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    skyboard_core::init()?;

    // Optional explicit config path, otherwise the per-user default
    let loaded = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => Config::load_validated_from(&path),
        None => Config::load_validated(),
    };
    let (config, _validation) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            let err = AppError::Config(ConfigError::Invalid(format!("{:#}", e)));
            tracing::error!("{}", err);
            eprintln!("{}", err.user_message());
            return Err(err.into());
        }
    };
    let weather = config.weather;

    let provider = skyboard_weather::initialize(&weather.weather_provider, weather.provider.clone())
        .map_err(AppError::from)
        .context("Failed to initialize weather provider")?;

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let (widget, _handle) = WeatherWidget::new(weather, provider, outbound_tx);
    let widget = widget.with_surface(Box::new(TracingSurface::new()));

    let cancel = CancellationToken::new();
    let widget_task = tokio::spawn(widget.run(cancel.clone()));

    let listener = tokio::spawn(async move {
        while let Some(notification) = outbound_rx.recv().await {
            match &notification {
                OutboundNotification::WeatherUpdated(payload) => tracing::info!(
                    "{}: {} hourly, {} daily records from {}",
                    notification.name(),
                    payload.hourly_array.len(),
                    payload.forecast_array.len(),
                    payload.provider_name
                ),
                OutboundNotification::CurrentWeatherType { weather_type } => {
                    tracing::info!("{}: {}", notification.name(), weather_type)
                }
            }
        }
    });

    tracing::info!("Skyboard running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    cancel.cancel();
    widget_task
        .await
        .context("Widget task panicked")?
        .context("Widget stopped with an error")?;
    listener.abort();

    tracing::info!("Skyboard stopped");
    Ok(())
}
