use crate::notification::InboundNotification;

/// Everything the widget reacts to, processed one at a time in arrival order.
#[derive(Debug, Clone)]
pub enum WidgetEvent {
    /// One-shot fetch timer fired
    FetchDue { generation: u64 },
    /// Recurring chart refresh timer fired
    RefreshTick { generation: u64 },
    /// Provider has new data readable
    DataAvailable,
    Notification(InboundNotification),
    Shutdown,
}

impl WidgetEvent {
    /// Timer generation, for timer events.
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::FetchDue { generation } | Self::RefreshTick { generation } => Some(*generation),
            _ => None,
        }
    }
}
