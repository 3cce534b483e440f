//! Visual state of the chart overlay.

use serde::Serialize;

/// Which series the chart overlay plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Hourly,
    Daily,
}

impl Granularity {
    pub fn flip(self) -> Self {
        match self {
            Self::Hourly => Self::Daily,
            Self::Daily => Self::Hourly,
        }
    }
}

/// Granularity and visibility are independent of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ViewState {
    pub granularity: Granularity,
    pub visible: bool,
}

/// User navigation inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    ToggleFull,
    NextPage,
    PreviousPage,
}

/// What the widget must do after a navigation input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTransition {
    /// Overlay became visible
    Shown,
    /// Overlay became hidden
    Hidden,
    /// Series must be rebuilt and redrawn, visible or not
    GranularityChanged(Granularity),
}

/// Owns the [`ViewState`]; starts hourly and hidden.
#[derive(Debug, Default)]
pub struct ViewStateMachine {
    state: ViewState,
}

impl ViewStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn handle(&mut self, input: Navigation) -> ViewTransition {
        match input {
            Navigation::ToggleFull => self.toggle_visibility(),
            Navigation::NextPage => self.flip_granularity(),
            Navigation::PreviousPage => self.flip_granularity(),
        }
    }

    fn toggle_visibility(&mut self) -> ViewTransition {
        self.state.visible = !self.state.visible;
        tracing::debug!("Chart overlay visible: {}", self.state.visible);
        if self.state.visible {
            ViewTransition::Shown
        } else {
            ViewTransition::Hidden
        }
    }

    fn flip_granularity(&mut self) -> ViewTransition {
        self.state.granularity = self.state.granularity.flip();
        tracing::debug!("Chart granularity: {:?}", self.state.granularity);
        ViewTransition::GranularityChanged(self.state.granularity)
    }
}
