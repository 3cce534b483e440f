use thiserror::Error;

use crate::surface::SurfaceError;

/// Errors raised while driving the widget
#[derive(Error, Debug)]
pub enum WidgetError {
    #[error("Invalid {notification} payload: {reason}")]
    InvalidPayload {
        notification: String,
        reason: String,
    },

    #[error("Payload decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Render surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Event channel closed")]
    Closed,
}

impl WidgetError {
    pub(crate) fn invalid(notification: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            notification: notification.to_string(),
            reason: reason.into(),
        }
    }
}
