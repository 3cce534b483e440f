//! Centralized error types for Skyboard.
//!
//! Typed errors for precise handling in the widget, plus `user_message()`
//! strings suitable for showing on the dashboard itself.

use skyboard_weather::WeatherError;
use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => weather_user_message(e),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Invalid type {0} configured (must be one of 'current', 'hourly', 'daily' or 'forecast')")]
    UnknownDisplayType(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::UnknownDisplayType(_) => "Unknown weather display type. Check your settings.",
        }
    }
}

fn weather_user_message(error: &WeatherError) -> &'static str {
    match error {
        WeatherError::Network(_) => "Unable to reach the weather service. Check your connection.",
        WeatherError::Url(_) => "Weather service address is invalid. Check settings.",
        WeatherError::Parse(_) => "Received unexpected weather data. Please try again.",
        WeatherError::UnknownProvider(_) => "Unknown weather provider. Check settings.",
    }
}
